//! Field validators shared by the login and registration forms.

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::ValidationError;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static BP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^BRG\d{8}$").expect("valid BP regex"));

/// Minimum password length accepted by the login form.
pub const LOGIN_MIN_PASSWORD_LEN: usize = 6;

/// Minimum password length for new or changed passwords.
pub const STRONG_MIN_PASSWORD_LEN: usize = 8;

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// `BRG` followed by eight digits, case-insensitive.
pub fn is_valid_bp(bp: &str) -> bool {
    BP_RE.is_match(bp)
}

/// Trims and uppercases an identifier typed into a form.
pub fn normalize_bp(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Checks the four password rules, reporting the first one broken.
pub fn check_password_strength(password: &str) -> Result<(), String> {
    if password.chars().count() < STRONG_MIN_PASSWORD_LEN {
        return Err(format!(
            "Senha deve ter no mínimo {STRONG_MIN_PASSWORD_LEN} caracteres"
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Senha deve conter pelo menos uma letra maiúscula".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Senha deve conter pelo menos uma letra minúscula".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Senha deve conter pelo menos um número".to_string());
    }
    Ok(())
}

pub fn is_strong_password(password: &str) -> bool {
    check_password_strength(password).is_ok()
}

pub(crate) fn require_email(email: &str) -> Result<(), ValidationError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(ValidationError::new("email", "Email inválido"))
    }
}

/// Participants must supply an identifier; returns it normalized.
pub(crate) fn require_bp(raw: &str) -> Result<String, ValidationError> {
    let bp = normalize_bp(raw);
    if bp.is_empty() {
        return Err(ValidationError::new("bp", "BP é obrigatório para participantes"));
    }
    if !is_valid_bp(&bp) {
        return Err(ValidationError::new("bp", "BP inválido. Formato: BRG12345678"));
    }
    Ok(bp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bp_accepts_brg_prefix_in_any_case() {
        assert!(is_valid_bp("BRG12345678"));
        assert!(is_valid_bp("brg12345678"));
        assert!(!is_valid_bp("brg123"));
        assert!(!is_valid_bp("BRX12345678"));
        assert!(!is_valid_bp("BRG123456789"));
        assert!(!is_valid_bp(" BRG12345678"));
        assert!(!is_valid_bp(""));
    }

    #[test]
    fn password_needs_all_four_rules() {
        assert!(is_strong_password("Abcdef12"));
        assert!(!is_strong_password("abcdefgh"));
        assert!(!is_strong_password("Ab1"));
        assert!(!is_strong_password("ABCDEFG1"));
        assert!(!is_strong_password("Abcdefgh"));
    }

    #[test]
    fn password_reports_first_broken_rule() {
        let err = check_password_strength("abcdefgh").unwrap_err();
        assert!(err.contains("maiúscula"), "{err}");
        let err = check_password_strength("Ab1").unwrap_err();
        assert!(err.contains("mínimo"), "{err}");
    }

    #[test]
    fn email_format() {
        assert!(is_valid_email("ana@escola.edu.br"));
        assert!(!is_valid_email("ana@escola"));
        assert!(!is_valid_email("ana escola@x.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn require_bp_normalizes_input() {
        assert_eq!(require_bp("  brg00000001 ").unwrap(), "BRG00000001");
        assert_eq!(require_bp("").unwrap_err().field, "bp");
        assert!(require_bp("XYZ").unwrap_err().message.contains("inválido"));
    }
}
