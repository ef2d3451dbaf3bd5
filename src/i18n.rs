// clickn-translate/src/i18n.rs

// ============================================================================
// MÓDULO I18N - Textos da interface (inglês / russo)
// ============================================================================

/// Textos exibidos nos diálogos e no overlay
#[derive(Debug)]
pub struct Strings {
    pub recognition_failed_title: &'static str,
    pub recognition_failed_body: &'static str,
    pub recognition_failed_hint: &'static str,
    pub translation_error_title: &'static str,
    pub translation_title: &'static str,
    pub hotkey_unavailable_title: &'static str,
    /// `{}` é substituído pela combinação
    pub hotkey_unavailable_body: &'static str,
    pub copy_button: &'static str,
    pub close_button: &'static str,
    pub copied: &'static str,
    pub recognizing: &'static str,
    pub translating: &'static str,
    pub tray_ocr: &'static str,
    pub tray_copy: &'static str,
    pub tray_translate: &'static str,
    pub tray_exit: &'static str,
}

static ENGLISH: Strings = Strings {
    recognition_failed_title: "Recognition failed",
    recognition_failed_body: "Text not recognized.",
    recognition_failed_hint: "Try: larger text, good contrast, a different OCR engine.",
    translation_error_title: "Translation error",
    translation_title: "Translation",
    hotkey_unavailable_title: "Hotkey unavailable",
    hotkey_unavailable_body: "Failed to register {}. It may be used by another program.\nTry a different combination in settings.",
    copy_button: "Copy",
    close_button: "Close",
    copied: "Copied",
    recognizing: "Recognizing…",
    translating: "Translating…",
    tray_ocr: "OCR",
    tray_copy: "Copy text",
    tray_translate: "Translate",
    tray_exit: "Exit",
};

static RUSSIAN: Strings = Strings {
    recognition_failed_title: "Не удалось распознать",
    recognition_failed_body: "Текст не распознан.",
    recognition_failed_hint: "Попробуйте: крупнее текст, хороший контраст, другой движок OCR.",
    translation_error_title: "Ошибка перевода",
    translation_title: "Перевод",
    hotkey_unavailable_title: "Горячая клавиша недоступна",
    hotkey_unavailable_body: "Не удалось зарегистрировать {}. Возможно, она занята другой программой.\nПопробуйте другую комбинацию в настройках.",
    copy_button: "Копировать",
    close_button: "Закрыть",
    copied: "Скопировано",
    recognizing: "Распознавание…",
    translating: "Перевод…",
    tray_ocr: "OCR",
    tray_copy: "Копировать текст",
    tray_translate: "Перевести",
    tray_exit: "Выход",
};

/// Textos para o idioma da interface ("ru" ou qualquer outro = inglês)
pub fn strings(interface_language: &str) -> &'static Strings {
    if interface_language.trim().eq_ignore_ascii_case("ru") {
        &RUSSIAN
    } else {
        &ENGLISH
    }
}

impl Strings {
    pub fn hotkey_unavailable(&self, combo: &str) -> String {
        self.hotkey_unavailable_body.replacen("{}", combo, 1)
    }

    pub fn recognition_failed(&self) -> String {
        format!("{}\n{}", self.recognition_failed_body, self.recognition_failed_hint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_interface_language_uses_english() {
        assert_eq!(strings("de").recognition_failed_title, "Recognition failed");
        assert_eq!(strings("RU").recognition_failed_title, "Не удалось распознать");
    }

    #[test]
    fn hotkey_message_names_the_combo() {
        let message = strings("en").hotkey_unavailable("Ctrl+Alt+T");
        assert!(message.contains("Ctrl+Alt+T"));
        assert!(!message.contains("{}"));
    }
}
