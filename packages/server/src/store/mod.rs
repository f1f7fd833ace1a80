mod service;

pub use service::{IdentificationView, ImageRef, ListPage, ListParams, ResultStore};
