pub mod article;
pub mod category;
pub mod deep_dive;
pub mod request;

pub use article::Article;
pub use category::Category;
pub use deep_dive::{DeepDive, Reference};
pub use request::{FetchRequest, Origin, Resolution};
