//! 题目元信息（难度、有效数字、学科）

use crate::models::{level_label, Language, ProblemItem, Subject};

/// 生成写入提示词的元信息文本
///
/// - 英文: `Level: <label>`，有有效数字要求时追加 `\nSignificant Figures: <sf>`
/// - 中文: `难度：<label>\n`，有有效数字要求时追加 `有效数字：<sf>\n`
///
/// `include_subject` 为真时在末尾附上学科描述。
pub fn build_meta_info(item: &ProblemItem, include_subject: bool) -> String {
    let label = level_label(item.level, item.language);
    let mut meta = match item.language {
        Language::English => {
            let mut s = format!("Level: {}", label);
            if let Some(sf) = item.sig_figs_hint() {
                s.push_str(&format!("\nSignificant Figures: {}", sf));
            }
            s
        }
        Language::Chinese => {
            let mut s = format!("难度：{}\n", label);
            if let Some(sf) = item.sig_figs_hint() {
                s.push_str(&format!("有效数字：{}\n", sf));
            }
            s
        }
    };

    if include_subject {
        if let Some(subject) = Subject::from_code(&item.subject) {
            match item.language {
                Language::English => {
                    meta.push_str(&format!("\nSubject: {}", subject.description(item.language)))
                }
                Language::Chinese => {
                    meta.push_str(&format!("学科：{}\n", subject.description(item.language)))
                }
            }
        }
    }

    meta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(language: &str, sig_figs: serde_json::Value) -> ProblemItem {
        serde_json::from_value(serde_json::json!({
            "index": 1, "question": "q", "subject": "CM", "level": 2,
            "language": language, "sig_figs": sig_figs
        }))
        .unwrap()
    }

    #[test]
    fn test_english_with_and_without_sig_figs() {
        let label = level_label(2, Language::English);
        assert_eq!(
            build_meta_info(&item("English", serde_json::json!("3")), false),
            format!("Level: {}\nSignificant Figures: 3", label)
        );
        assert_eq!(
            build_meta_info(&item("English", serde_json::json!("")), false),
            format!("Level: {}", label)
        );
    }

    #[test]
    fn test_chinese_format() {
        let label = level_label(2, Language::Chinese);
        assert_eq!(
            build_meta_info(&item("Chinese", serde_json::json!(2)), false),
            format!("难度：{}\n有效数字：2\n", label)
        );
        assert_eq!(
            build_meta_info(&item("Chinese", serde_json::Value::Null), false),
            format!("难度：{}\n", label)
        );
    }

    #[test]
    fn test_include_subject_appends_description() {
        let meta = build_meta_info(&item("English", serde_json::Value::Null), true);
        assert!(meta.contains("\nSubject: "));
        let plain = build_meta_info(&item("English", serde_json::Value::Null), false);
        assert!(meta.starts_with(&plain));
    }
}
