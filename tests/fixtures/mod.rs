//! Payloads and images shared by the integration tests

#![allow(dead_code)]

use image::{ImageFormat, Rgb, RgbImage};
use serde_json::{json, Value};
use std::io::Cursor;

pub const CHANNEL_SECRET: &str = "test-channel-secret";
pub const USER_ID: &str = "U4af4980629";

/// A small PNG, as a phone would never send but LINE happily forwards.
pub fn png_bytes() -> Vec<u8> {
    let img = RgbImage::from_pixel(16, 12, Rgb([180, 90, 30]));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("encode png");
    buf
}

pub fn image_event(message_id: &str, reply_token: &str, user_id: &str) -> Value {
    json!({
        "type": "message",
        "mode": "active",
        "timestamp": 1700000000000u64,
        "replyToken": reply_token,
        "source": { "type": "user", "userId": user_id },
        "message": {
            "id": message_id,
            "type": "image",
            "contentProvider": { "type": "line" }
        }
    })
}

pub fn text_event(reply_token: &str, user_id: &str) -> Value {
    json!({
        "type": "message",
        "mode": "active",
        "timestamp": 1700000000000u64,
        "replyToken": reply_token,
        "source": { "type": "user", "userId": user_id },
        "message": { "id": "t-1", "type": "text", "text": "how many calories?" }
    })
}

pub fn payload(events: Vec<Value>) -> Vec<u8> {
    serde_json::to_vec(&json!({ "destination": "Ubot", "events": events }))
        .expect("serialize payload")
}

/// Labels file line in YOLO `--save-txt --save-conf` format.
pub fn label_line(class_index: i64) -> String {
    format!("{class_index} 0.87 0.512 0.433 0.250 0.310")
}
