use crate::headers::CommonHeaders;
use crate::models::{ApiError, NewPet, Pet};

pub struct PetApi;

impl PetApi {
    /// @Summary List pets
    /// @Tags pets
    /// @Param limit query int false "Maximum number of pets" "20"
    /// @Param kind query string false "Filter by kind"
    /// @Success 200 {array} Pet "The pets"
    /// @Router /pets [get]
    pub async fn list_pets(&self) {}

    /// @Summary Create a pet
    /// @Description Adds a pet to the store.
    /// @ID createPet
    /// @Tags pets
    /// @Header CommonHeaders
    /// @Param pet body NewPet true "The pet to add"
    /// @Success 201 {object} Pet "Created"
    /// @Failure 400 {object} ApiError "Invalid pet"
    /// @Router /pets [post]
    pub async fn create_pet(&self) {}
}

/// Returns one pet.
///
/// @Summary Get a pet
/// @Tags pets
/// @Header CommonHeaders Authorization
/// @Param id path u64 true "Pet ID"
/// @Success 200 {object} Pet
/// @Failure 404 "Not found"
/// @Router /pets/:id [get]
pub async fn get_pet() {}

/// @Summary Upload a photo
/// @Param id path u64 true "Pet ID"
/// @Param photo form file true "Photo file"
/// @Param caption form string false "Caption"
/// @Success 204 "Stored"
/// @Router /pets/{id}/photo [put]
pub async fn upload_photo() {}

/// @Deprecated
/// @Summary Old listing
/// @Router /animals [get]
pub async fn list_animals() {}

/// Helper without annotations
fn internal_helper() {}
