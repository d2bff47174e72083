//! User-facing strings for the key dialog, per locale.

use serde::{Deserialize, Serialize};

use crate::validation::{KeyRules, RejectReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Vi,
}

impl Locale {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Some(Locale::En),
            "vi" | "vietnamese" => Some(Locale::Vi),
            _ => None,
        }
    }
}

/// Static labels rendered by the dialog.
#[derive(Debug)]
pub struct DialogText {
    pub title: &'static str,
    pub field_label: &'static str,
    pub storage_note: &'static str,
    pub help_heading: &'static str,
    pub help_visit: &'static str,
    pub help_link: &'static str,
    pub help_create: &'static str,
    pub help_paste: &'static str,
    pub show_key: &'static str,
    pub hide_key: &'static str,
    pub cancel: &'static str,
    pub confirm: &'static str,
    pub checking: &'static str,
}

static EN: DialogText = DialogText {
    title: "Configure API Key",
    field_label: "Gemini API Key",
    storage_note: "The API key is stored locally on this machine and only you can see it.",
    help_heading: "How do I get an API key?",
    help_visit: "1. Visit",
    help_link: "Google AI Studio",
    help_create: "2. Sign in and create a new API key",
    help_paste: "3. Copy it and paste it here",
    show_key: "Show key",
    hide_key: "Hide key",
    cancel: "Cancel",
    confirm: "Confirm and Save",
    checking: "Checking...",
};

static VI: DialogText = DialogText {
    title: "Cấu hình API Key",
    field_label: "Gemini API Key",
    storage_note: "API key sẽ được lưu cục bộ trên máy của bạn và chỉ bạn có thể xem.",
    help_heading: "Làm thế nào để lấy API key?",
    help_visit: "1. Truy cập",
    help_link: "Google AI Studio",
    help_create: "2. Đăng nhập và tạo API key mới",
    help_paste: "3. Sao chép và dán vào đây",
    show_key: "Hiện key",
    hide_key: "Ẩn key",
    cancel: "Hủy",
    confirm: "Xác nhận và Lưu",
    checking: "Đang kiểm tra...",
};

pub fn dialog_text(locale: Locale) -> &'static DialogText {
    match locale {
        Locale::En => &EN,
        Locale::Vi => &VI,
    }
}

/// Input hint mentioning the expected prefix.
pub fn placeholder(locale: Locale, prefix: &str) -> String {
    match locale {
        Locale::En => format!("Enter your API key (starts with {prefix}...)"),
        Locale::Vi => format!("Nhập API key của bạn (bắt đầu bằng {prefix}...)"),
    }
}

/// Inline error shown under the input for a rejected key.
pub fn reject_message(locale: Locale, reason: RejectReason, rules: &KeyRules) -> String {
    let prefix = rules.prefix.as_str();
    match (locale, reason) {
        (Locale::En, RejectReason::EmptyInput) => "Please enter an API key".to_string(),
        (Locale::En, RejectReason::BadFormat) => format!(
            "The API key has the wrong format. Gemini API keys usually start with \"{prefix}\""
        ),
        (Locale::En, RejectReason::TooShort) => {
            "The API key is too short. Please check it again.".to_string()
        }
        (Locale::En, RejectReason::RemoteRejected) => {
            "The API key is invalid or has been disabled".to_string()
        }
        (Locale::En, RejectReason::Unverified) => {
            "The API key could not be verified right now. Please try again later.".to_string()
        }
        (Locale::Vi, RejectReason::EmptyInput) => "Vui lòng nhập API key".to_string(),
        (Locale::Vi, RejectReason::BadFormat) => format!(
            "API key không đúng định dạng. Gemini API key thường bắt đầu bằng \"{prefix}\""
        ),
        (Locale::Vi, RejectReason::TooShort) => {
            "API key quá ngắn. Vui lòng kiểm tra lại.".to_string()
        }
        (Locale::Vi, RejectReason::RemoteRejected) => {
            "API key không hợp lệ hoặc đã bị vô hiệu hóa".to_string()
        }
        (Locale::Vi, RejectReason::Unverified) => {
            "Không thể xác minh API key lúc này. Vui lòng thử lại sau.".to_string()
        }
    }
}
