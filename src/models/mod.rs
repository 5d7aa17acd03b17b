//! Data models
//!
//! Database entities (news, galleries, slider, menu pages), request inputs
//! and the response views exchanged with the front-end.

mod common;
mod gallery;
mod menu;
mod news;
mod slider;

pub use common::{flag, option_flag, parse_flag, Language, OrderUpdate, RecordStatus};
pub use gallery::{DeleteGalleryImageInput, Gallery, GalleryImage, GalleryInput};
pub use menu::{MenuItem, MenuPage};
pub use news::{
    CreateNewsInput, LocalizedNews, News, NewsAdminView, NewsContent, NewsContentFields,
    NewsWithContent, UpdateNewsInput,
};
pub use slider::{Slider, SliderInput};
