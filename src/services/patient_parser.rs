//! 患者描述解析
//!
//! 把 `"Mark Long 11/13/1965"` 这样的自由文本拆成姓名和出生日期

use crate::error::ParseError;
use crate::models::PatientIdentity;

/// 日期分隔符
const DATE_SEPARATOR: char = '/';

/// 判断一个词是否"看起来像日期"
///
/// 只看形状：包含分隔符且切分后恰好三段，不校验月/日范围
pub fn is_date_token(token: &str) -> bool {
    token.contains(DATE_SEPARATOR) && token.split(DATE_SEPARATOR).count() == 3
}

/// 解析患者描述
///
/// 出现多个日期形状的词时取最后一个作为出生日期，其余词按原顺序组成姓名
pub fn parse_patient_descriptor(input: &str) -> Result<PatientIdentity, ParseError> {
    let mut date_of_birth = None;
    let mut name_parts = Vec::new();

    for token in input.split_whitespace() {
        if is_date_token(token) {
            date_of_birth = Some(token.to_string());
        } else {
            name_parts.push(token);
        }
    }

    let name = name_parts.join(" ");
    if name.is_empty() {
        return Err(ParseError::EmptyName {
            input: input.to_string(),
        });
    }

    Ok(PatientIdentity::new(name, date_of_birth))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_with_dob() {
        let identity = parse_patient_descriptor("Mark Long 11/13/1965").unwrap();
        assert_eq!(identity.name, "Mark Long");
        assert_eq!(identity.date_of_birth.as_deref(), Some("11/13/1965"));
    }

    #[test]
    fn test_name_only() {
        let identity = parse_patient_descriptor("Mark Long").unwrap();
        assert_eq!(identity.name, "Mark Long");
        assert_eq!(identity.date_of_birth, None);
    }

    #[test]
    fn test_dob_in_middle_keeps_name_order() {
        let identity = parse_patient_descriptor("  Mary 1/2/1980   Ann  Smith ").unwrap();
        assert_eq!(identity.name, "Mary Ann Smith");
        assert_eq!(identity.date_of_birth.as_deref(), Some("1/2/1980"));
    }

    #[test]
    fn test_empty_or_date_only_fails() {
        assert!(parse_patient_descriptor("").is_err());
        assert!(parse_patient_descriptor("   ").is_err());
        assert!(parse_patient_descriptor("11/13/1965").is_err());
    }

    #[test]
    fn test_date_shape_is_loose() {
        assert!(is_date_token("11/13/1965"));
        assert!(is_date_token("99/99/9"));
        assert!(!is_date_token("11/1965"));
        assert!(!is_date_token("1/2/3/4"));
        assert!(!is_date_token("11-13-1965"));

        // 两段的斜杠词保留在姓名中
        let identity = parse_patient_descriptor("Anne-Marie O/Neil").unwrap();
        assert_eq!(identity.name, "Anne-Marie O/Neil");
    }
}
