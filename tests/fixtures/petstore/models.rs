use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A pet in the store.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: u64,
    /// Display name
    pub name: String,
    pub kind: PetKind,
    pub owner: Option<Box<Owner>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub birth_date: Option<String>,
    pub attributes: HashMap<String, String>,
    #[serde(skip)]
    pub internal_notes: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetKind {
    Dog,
    Cat,
    Bird,
}

/// Someone who owns pets.
#[derive(Debug, Serialize, Deserialize)]
pub struct Owner {
    pub id: u64,
    pub name: String,
    pub pets: Vec<Pet>,
}

#[derive(Debug, Deserialize)]
pub struct NewPet {
    pub name: String,
    pub kind: PetKind,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: u16,
    pub message: String,
}
