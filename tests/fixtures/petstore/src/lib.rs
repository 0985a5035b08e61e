/**
 * @OA\Info(
 *     title="Petstore",
 *     version="1.0.0",
 *     description="A sample pet store"
 * )
 * @OA\Server(url="https://petstore.example.com/v1")
 * @OA\Tag(name="pets", description="Everything about your pets")
 */
pub mod pets;
