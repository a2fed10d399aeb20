//! 提示词模板库
//!
//! 目录结构为 `<dir>/<task>/<lang>.toml`，每个文件是 `段落名 = "模板"` 的表。
//! 模板用 `{name}` 占位，`{{` 和 `}}` 转义为字面花括号。

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::PromptError;

type SectionMap = HashMap<String, String>;

/// 按 (task, lang) 索引的模板集合
#[derive(Debug, Clone, Default)]
pub struct PromptStore {
    templates: HashMap<(String, String), SectionMap>,
}

impl PromptStore {
    /// 从模板目录加载全部模板
    pub fn load(dir: &Path) -> Result<Self, PromptError> {
        let mut templates = HashMap::new();
        for task_entry in fs::read_dir(dir).map_err(read_failed(dir))? {
            let task_dir = task_entry.map_err(read_failed(dir))?.path();
            if !task_dir.is_dir() {
                continue;
            }
            let Some(task) = task_dir.file_name().map(|n| n.to_string_lossy().into_owned())
            else {
                continue;
            };

            for file_entry in fs::read_dir(&task_dir).map_err(read_failed(&task_dir))? {
                let file = file_entry.map_err(read_failed(&task_dir))?.path();
                if file.extension().and_then(|e| e.to_str()) != Some("toml") {
                    continue;
                }
                let Some(lang) = file.file_stem().map(|s| s.to_string_lossy().into_owned())
                else {
                    continue;
                };
                let content = fs::read_to_string(&file).map_err(read_failed(&file))?;
                let sections: SectionMap =
                    toml::from_str(&content).map_err(|source| PromptError::ParseFailed {
                        path: file.clone(),
                        source,
                    })?;
                debug!("加载提示词 {}/{}: {} 个段落", task, lang, sections.len());
                templates.insert((task.clone(), lang), sections);
            }
        }

        info!("✓ 已加载 {} 组提示词模板", templates.len());
        Ok(Self { templates })
    }

    /// 直接由 (task, lang, section, template) 条目构建
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str, &'a str, &'a str)>) -> Self {
        let mut templates: HashMap<(String, String), SectionMap> = HashMap::new();
        for (task, lang, section, template) in entries {
            templates
                .entry((task.to_string(), lang.to_string()))
                .or_default()
                .insert(section.to_string(), template.to_string());
        }
        Self { templates }
    }

    /// 查找模板原文
    pub fn get_prompt(&self, task: &str, section: &str, lang: &str) -> Result<&str, PromptError> {
        let sections = self
            .templates
            .get(&(task.to_string(), lang.to_string()))
            .ok_or_else(|| PromptError::TaskNotFound {
                task: task.to_string(),
                lang: lang.to_string(),
            })?;
        sections
            .get(section)
            .map(String::as_str)
            .ok_or_else(|| PromptError::SectionNotFound {
                task: task.to_string(),
                section: section.to_string(),
                lang: lang.to_string(),
            })
    }

    /// 启动时检查流程所需的每个 (task, section) 在每种语言下都存在
    pub fn ensure_sections(
        &self,
        required: &[(&str, &str)],
        langs: &[&str],
    ) -> Result<(), PromptError> {
        for lang in langs {
            for (task, section) in required {
                self.get_prompt(task, section, lang)?;
            }
        }
        Ok(())
    }

    /// 查找并填充模板
    pub fn render(
        &self,
        task: &str,
        section: &str,
        lang: &str,
        fields: &[(&str, &str)],
    ) -> Result<String, PromptError> {
        format_template(self.get_prompt(task, section, lang)?, fields)
    }
}

fn read_failed(path: &Path) -> impl FnOnce(std::io::Error) -> PromptError {
    let path = path.to_path_buf();
    move |source| PromptError::ReadFailed { path, source }
}

/// 填充 `{name}` 占位符
///
/// 模板中出现但 `fields` 中没有的字段返回 `MissingField`；
/// 未配对的单个花括号返回 `Malformed`。
pub fn format_template(template: &str, fields: &[(&str, &str)]) -> Result<String, PromptError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                out.push('{');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, '{')) | None => return Err(PromptError::Malformed(pos)),
                        Some((_, ch)) => name.push(ch),
                    }
                }
                let value = fields
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| *value)
                    .ok_or(PromptError::MissingField(name))?;
                out.push_str(value);
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                out.push('}');
            }
            '}' => return Err(PromptError::Malformed(pos)),
            _ => out.push(c),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_fills_fields_and_escapes() {
        let out = format_template(
            "Q: {question}\n{{json}} {meta_info}",
            &[("question", "g?"), ("meta_info", "Level: 1")],
        )
        .unwrap();
        assert_eq!(out, "Q: g?\n{json} Level: 1");
    }

    #[test]
    fn test_values_are_not_reinterpreted() {
        let out = format_template("{image_code}", &[("image_code", "ctx.fill({x: 1})")]).unwrap();
        assert_eq!(out, "ctx.fill({x: 1})");
    }

    #[test]
    fn test_unknown_field_is_error() {
        let err = format_template("{question} {answer}", &[("question", "q")]).unwrap_err();
        assert!(matches!(err, PromptError::MissingField(ref f) if f == "answer"));
    }

    #[test]
    fn test_unbalanced_braces() {
        assert!(matches!(
            format_template("a } b", &[]),
            Err(PromptError::Malformed(2))
        ));
        assert!(matches!(
            format_template("a {open", &[]),
            Err(PromptError::Malformed(2))
        ));
    }

    #[test]
    fn test_lookup_errors() {
        let store = PromptStore::from_entries([("critic", "en", "generate", "{question}")]);
        assert_eq!(store.get_prompt("critic", "generate", "en").unwrap(), "{question}");
        assert!(matches!(
            store.get_prompt("critic", "generate", "zh"),
            Err(PromptError::TaskNotFound { .. })
        ));
        assert!(matches!(
            store.get_prompt("critic", "self_consistency", "en"),
            Err(PromptError::SectionNotFound { .. })
        ));
    }

    #[test]
    fn test_ensure_sections_reports_missing_language_and_section() {
        let store = PromptStore::from_entries([
            ("critic", "en", "generate", "{question}"),
            ("critic", "en", "self_consistency", "{roll_out_responses}"),
            ("critic", "zh", "generate", "{question}"),
        ]);
        let required = [("critic", "generate"), ("critic", "self_consistency")];
        assert!(store.ensure_sections(&required, &["en"]).is_ok());
        assert!(matches!(
            store.ensure_sections(&required, &["en", "zh"]),
            Err(PromptError::SectionNotFound { ref lang, ref section, .. })
                if lang == "zh" && section == "self_consistency"
        ));
        assert!(matches!(
            store.ensure_sections(&[("i2t", "generate")], &["en"]),
            Err(PromptError::TaskNotFound { .. })
        ));
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("critic")).unwrap();
        std::fs::write(
            dir.path().join("critic/en.toml"),
            "generate = \"Solve: {question}\"\nself_consistency = \"{roll_out_responses}\"\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("critic/notes.txt"), "ignored").unwrap();

        let store = PromptStore::load(dir.path()).unwrap();
        let out = store
            .render("critic", "generate", "en", &[("question", "why?")])
            .unwrap();
        assert_eq!(out, "Solve: why?");
    }

    #[test]
    fn test_shipped_templates_have_expected_fields() {
        let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("prompts/templates");
        let store = PromptStore::load(&dir).unwrap();
        for lang in ["en", "zh"] {
            store
                .render(
                    "critic",
                    "generate",
                    lang,
                    &[("question", "q"), ("image_code", ""), ("meta_info", "m")],
                )
                .unwrap();
            store
                .render(
                    "critic",
                    "self_consistency",
                    lang,
                    &[("roll_out_responses", "r"), ("question", "q")],
                )
                .unwrap();
            store
                .render("i2t", "generate", lang, &[("question", "q"), ("img_type", "t")])
                .unwrap();
        }
    }
}
