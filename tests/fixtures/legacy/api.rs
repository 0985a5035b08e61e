/// @OA\Info(title="Legacy", version="0.1.0")
pub mod api {}

// @OA\Get(path="/legacy", @OA\Response(response=200, description="ok"))
pub fn legacy() {}

#[oa::get(path = "/attribute", oa::response(response = 200, description = "ok"))]
pub fn attribute() {}
