pub mod generate;
pub mod health;
pub mod images;
pub mod posters;
pub mod templates;

pub use generate::{handle_generate, GenerateRequest, GenerateResponse, __path_handle_generate};
pub use health::{handle_health, HealthResponse, LlmStatus, ServiceStatus, __path_handle_health};
pub use images::{handle_get_image, handle_upload_image, UploadResponse};
pub use images::{__path_handle_get_image, __path_handle_upload_image};
pub use posters::{
    handle_export_poster, handle_get_poster, handle_poster_image, handle_update_poster,
    ExportFormat, ExportRequest, PosterResponse, UpdatePosterRequest, UpdatePosterResponse,
};
pub use posters::{
    __path_handle_export_poster, __path_handle_get_poster, __path_handle_poster_image,
    __path_handle_update_poster,
};
pub use templates::{
    handle_get_template, handle_list_templates, TemplateListResponse, TemplateResponse,
    __path_handle_get_template, __path_handle_list_templates,
};
