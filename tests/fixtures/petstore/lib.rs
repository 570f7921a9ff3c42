//! @Title Pet Store
//! @Version 1.2.0
//! @Description Pets, owners and adoptions
//! @Server https://petstore.example.com/api "Production"

pub mod handlers;
pub mod headers;
pub mod models;
