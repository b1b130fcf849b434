//! i18n.rs — the few user-facing strings the core itself produces.

use crate::error::FetchError;
use crate::market::Language;

#[derive(Debug, Clone, Copy)]
pub struct Messages {
    pub fetch_failed: &'static str,
    pub missing_key: &'static str,
    pub retry: &'static str,
}

const EN: Messages = Messages {
    fetch_failed: "Failed to fetch live market data. Please try again.",
    missing_key: "The AI service is not configured. Contact the administrator.",
    retry: "Retry",
};

const AR: Messages = Messages {
    fetch_failed: "فشل في جلب بيانات السوق المباشرة. يرجى المحاولة مرة أخرى.",
    missing_key: "خدمة الذكاء الاصطناعي غير مهيأة. يرجى التواصل مع المسؤول.",
    retry: "إعادة المحاولة",
};

pub fn messages(language: Language) -> &'static Messages {
    match language {
        Language::En => &EN,
        Language::Ar => &AR,
    }
}

/// Localized text shown in place of the raw error.
pub fn error_message(err: &FetchError, language: Language) -> String {
    let m = messages(language);
    if err.is_configuration() {
        m.missing_key.to_string()
    } else {
        m.fetch_failed.to_string()
    }
}
