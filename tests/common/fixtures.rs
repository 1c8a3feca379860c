//! Test fixtures and constants.

use image::{Rgba, RgbaImage};
use std::io::Cursor;

/// Prompts used across the API tests
pub mod prompts {
    pub const SUMMER_SALE: &str = "Summer Sale";
    pub const COFFEE_OPENING: &str = "咖啡店开业大酬宾";
}

/// Model reply wrapping a design in a fenced block, the way chat models answer
pub fn fenced_design_reply(design: &serde_json::Value) -> String {
    format!(
        "好的，这是海报设计方案：\n```json\n{}\n```\n希望你喜欢！",
        serde_json::to_string_pretty(design).unwrap()
    )
}

/// A solid-colour PNG
pub fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba(color));
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, image::ImageFormat::Png)
        .expect("Failed to encode PNG");
    buf.into_inner()
}

/// Minimal poster document on a solid background
pub fn solid_poster(width: u32, height: u32, color: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "custom",
        "name": "Custom",
        "category": "测试",
        "size": {"width": width, "height": height},
        "background": {"type": "solid", "color": color},
        "elements": [
            {
                "id": "title",
                "type": "text",
                "position": {"x": width / 2, "y": height / 2},
                "style": {"fontSize": 32, "color": "#000000", "textAlign": "center"},
                "content": "Edited"
            }
        ]
    })
}
