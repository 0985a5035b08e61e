/// A pet in the store.
///
/// @OA\Schema(
///     schema="Pet",
///     type="object",
///     required={"id", "name"},
///     @OA\Property(property="id", type="integer", format="int64"),
///     @OA\Property(property="name", type="string")
/// )
pub struct Pet {
    pub id: i64,
    pub name: String,
}

/// @OA\Get(
///     path="/pets",
///     tags={"pets"},
///     summary="List all pets",
///     @OA\Parameter(name="limit", in="query", type="integer", description="How many items to return"),
///     @OA\Response(response=200, description="A paged array of pets")
/// )
pub fn list_pets() -> Vec<Pet> {
    Vec::new()
}

#[oa::get(path = "/pets/{petId}", tags = ["pets"], summary = "Info for a specific pet")]
#[oa::parameter(name = "petId", in = "path", type = "string")]
#[oa::response(response = 200, description = "Expected response to a valid request")]
pub fn show_pet_by_id(_id: &str) -> Option<Pet> {
    None
}
