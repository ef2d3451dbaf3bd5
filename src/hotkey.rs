// clickn-translate/src/hotkey.rs

// ============================================================================
// MÓDULO HOTKEY - Parser de combinações ("Ctrl+Alt+T")
// ============================================================================
//
// Converte o texto configurado em (modificadores, virtual key) no formato
// que o RegisterHotKey espera. Letras do layout russo valem como a letra
// latina da mesma tecla física.
//
// ============================================================================

use thiserror::Error;

// Modificadores do RegisterHotKey
pub const MOD_ALT: u32 = 0x0001;
pub const MOD_CONTROL: u32 = 0x0002;
pub const MOD_SHIFT: u32 = 0x0004;
pub const MOD_WIN: u32 = 0x0008;
/// Segurar a tecla não repete o disparo
pub const MOD_NOREPEAT: u32 = 0x4000;

/// Erros de hotkey
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HotkeyError {
    #[error("combinação '{0}' não tem tecla principal")]
    NoMainKey(String),
    #[error("combinação '{0}' tem mais de uma tecla principal")]
    MultipleMainKeys(String),
    #[error("tecla desconhecida '{key}' em '{combo}'")]
    UnknownKey { combo: String, key: String },
    #[error("falha ao registrar '{0}'")]
    RegistrationFailed(String),
}

/// Combinação pronta para o RegisterHotKey
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyCombo {
    /// Modificadores, sempre com MOD_NOREPEAT
    pub modifiers: u32,
    /// Virtual key code da tecla principal
    pub vk: u32,
}

/// Mapeia uma letra do layout russo para a letra latina da mesma tecla
fn cyrillic_alias(token: &str) -> Option<&'static str> {
    let alias = match token {
        "й" => "q",
        "ц" => "w",
        "у" => "e",
        "к" => "r",
        "е" => "t",
        "н" => "y",
        "г" => "u",
        "ш" => "i",
        "щ" => "o",
        "з" => "p",
        "х" => "[",
        "ъ" => "]",
        "ф" => "a",
        "ы" => "s",
        "в" => "d",
        "а" => "f",
        "п" => "g",
        "р" => "h",
        "о" => "j",
        "л" => "k",
        "д" => "l",
        "ж" => ";",
        "э" => "'",
        "я" => "z",
        "ч" => "x",
        "с" => "c",
        "м" => "v",
        "и" => "b",
        "т" => "n",
        "ь" => "m",
        "б" => ",",
        "ю" => ".",
        "ё" => "`",
        _ => return None,
    };
    Some(alias)
}

fn modifier_flag(token: &str) -> Option<u32> {
    match token {
        "ctrl" | "control" => Some(MOD_CONTROL),
        "alt" => Some(MOD_ALT),
        "shift" => Some(MOD_SHIFT),
        "win" | "meta" | "super" => Some(MOD_WIN),
        _ => None,
    }
}

/// Virtual key code de um token de tecla principal (já em minúsculas)
fn virtual_key(token: &str) -> Option<u32> {
    let special = match token {
        ";" => Some(0xBA),
        "=" => Some(0xBB),
        "," => Some(0xBC),
        "-" => Some(0xBD),
        "." => Some(0xBE),
        "/" => Some(0xBF),
        "`" => Some(0xC0),
        "[" => Some(0xDB),
        "\\" => Some(0xDC),
        "]" => Some(0xDD),
        "'" => Some(0xDE),
        "space" => Some(0x20),
        "enter" | "return" => Some(0x0D),
        "tab" => Some(0x09),
        "backspace" => Some(0x08),
        "escape" | "esc" => Some(0x1B),
        "delete" | "del" => Some(0x2E),
        "insert" | "ins" => Some(0x2D),
        "home" => Some(0x24),
        "end" => Some(0x23),
        "pageup" | "pgup" => Some(0x21),
        "pagedown" | "pgdn" => Some(0x22),
        "up" => Some(0x26),
        "down" => Some(0x28),
        "left" => Some(0x25),
        "right" => Some(0x27),
        "printscreen" | "print" => Some(0x2C),
        "pause" => Some(0x13),
        "numlock" => Some(0x90),
        "capslock" => Some(0x14),
        "scrolllock" => Some(0x91),
        _ => None,
    };
    if special.is_some() {
        return special;
    }

    // F1..F24
    if let Some(number) = token.strip_prefix('f') {
        if let Ok(n) = number.parse::<u32>() {
            if (1..=24).contains(&n) {
                return Some(0x70 + n - 1);
            }
        }
    }

    // Letras e dígitos: VK = código ASCII maiúsculo
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphanumeric() => Some(c.to_ascii_uppercase() as u32),
        _ => None,
    }
}

/// Converte "Ctrl+Alt+T" em modificadores + virtual key
///
/// # Retorna
/// * `HotkeyCombo` com MOD_NOREPEAT sempre incluído
/// * `HotkeyError` se não houver exatamente uma tecla principal
pub fn parse_hotkey(combo: &str) -> Result<HotkeyCombo, HotkeyError> {
    let mut modifiers = 0;
    let mut main_key: Option<u32> = None;

    for raw in combo.split('+') {
        let lowered = raw.trim().to_lowercase();
        if lowered.is_empty() {
            continue;
        }
        let token = match cyrillic_alias(&lowered) {
            Some(latin) => latin,
            None => lowered.as_str(),
        };

        if let Some(flag) = modifier_flag(token) {
            modifiers |= flag;
            continue;
        }

        let vk = virtual_key(token).ok_or_else(|| HotkeyError::UnknownKey {
            combo: combo.to_string(),
            key: raw.trim().to_string(),
        })?;

        if main_key.is_some() {
            return Err(HotkeyError::MultipleMainKeys(combo.to_string()));
        }
        main_key = Some(vk);
    }

    let vk = main_key.ok_or_else(|| HotkeyError::NoMainKey(combo.to_string()))?;

    Ok(HotkeyCombo {
        modifiers: modifiers | MOD_NOREPEAT,
        vk,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_default_translate_hotkey() {
        let combo = parse_hotkey("Ctrl+Alt+T").unwrap();
        assert_eq!(combo.modifiers, MOD_CONTROL | MOD_ALT | MOD_NOREPEAT);
        assert_eq!(combo.vk, 0x54);
    }

    #[test]
    fn cyrillic_letter_maps_to_same_physical_key() {
        let latin = parse_hotkey("Ctrl+Alt+T").unwrap();
        let cyrillic = parse_hotkey("Ctrl+Alt+Е").unwrap();
        assert_eq!(latin, cyrillic);

        assert_eq!(parse_hotkey("Shift+Б").unwrap().vk, 0xBC);
        assert_eq!(parse_hotkey("ctrl+ё").unwrap().vk, 0xC0);
        assert_eq!(parse_hotkey("Ctrl+Ё").unwrap(), parse_hotkey("Ctrl+`").unwrap());
    }

    #[test]
    fn parsing_is_case_insensitive_and_modifier_aliases_match() {
        let a = parse_hotkey("control+SHIFT+x").unwrap();
        let b = parse_hotkey("Ctrl+Shift+X").unwrap();
        assert_eq!(a, b);
        assert_eq!(
            parse_hotkey("Super+A").unwrap().modifiers,
            parse_hotkey("Win+A").unwrap().modifiers
        );
    }

    #[test]
    fn named_and_function_keys() {
        assert_eq!(parse_hotkey("Alt+F1").unwrap().vk, 0x70);
        assert_eq!(parse_hotkey("Alt+F24").unwrap().vk, 0x87);
        assert_eq!(parse_hotkey("Ctrl+PgDn").unwrap().vk, 0x22);
        assert_eq!(parse_hotkey("Ctrl+Space").unwrap().vk, 0x20);
        assert_eq!(parse_hotkey("Ctrl+7").unwrap().vk, 0x37);
    }

    #[test]
    fn modifiers_only_is_rejected() {
        assert_eq!(
            parse_hotkey("Ctrl+Alt"),
            Err(HotkeyError::NoMainKey("Ctrl+Alt".to_string()))
        );
        assert!(matches!(parse_hotkey(""), Err(HotkeyError::NoMainKey(_))));
    }

    #[test]
    fn two_main_keys_are_rejected() {
        assert_eq!(
            parse_hotkey("Ctrl+A+B"),
            Err(HotkeyError::MultipleMainKeys("Ctrl+A+B".to_string()))
        );
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(matches!(
            parse_hotkey("Ctrl+F25"),
            Err(HotkeyError::UnknownKey { .. })
        ));
    }
}
