/// @OA\Info(title=API_TITLE, version="2.0.0")
/// @OA\Get(path="/status", @OA\Response(response=200, description="ok"))
pub fn status() {}
