//! Markdown splitting along a configurable heading scheme.
//!
//! Each fragment covers one heading scope and keeps its heading lines, so a
//! section read in isolation still says which dish and step it belongs to.
//! Headings inside fenced code blocks are ignored.

use crate::config::HeaderLevel;
use crate::traits::StructureSplitter;
use crate::types::{Fragment, Meta};

#[derive(Debug, Clone)]
struct Level {
    marker: String,
    depth: usize,
    label: String,
}

#[derive(Debug, Clone)]
pub struct MarkdownHeaderSplitter {
    // longest marker first so "###" is tried before "#"
    levels: Vec<Level>,
}

impl Default for MarkdownHeaderSplitter {
    fn default() -> Self { Self::new(&crate::config::PrepSettings::default().headers) }
}

impl MarkdownHeaderSplitter {
    pub fn new(headers: &[HeaderLevel]) -> Self {
        let mut levels: Vec<Level> = headers
            .iter()
            .map(|h| Level { marker: h.marker.clone(), depth: h.marker.chars().filter(|c| *c == '#').count(), label: h.label.clone() })
            .collect();
        levels.sort_by(|a, b| b.marker.len().cmp(&a.marker.len()));
        Self { levels }
    }

    fn heading<'a>(&self, line: &'a str) -> Option<(&Level, &'a str)> {
        self.levels.iter().find_map(|level| {
            let rest = line.strip_prefix(level.marker.as_str())?;
            if rest.is_empty() || rest.starts_with(' ') { Some((level, rest.trim())) } else { None }
        })
    }

    /// Heading-scoped groups of lines, before adjacent groups are merged.
    fn line_groups(&self, text: &str) -> Vec<Fragment> {
        let mut groups = Vec::new();
        let mut stack: Vec<(usize, String)> = Vec::new();
        let mut active = Meta::new();
        let mut current: Vec<&str> = Vec::new();
        let mut fence: Option<&'static str> = None;

        for raw in text.lines() {
            let line = raw.trim();
            match fence {
                None if line.starts_with("```") && line.matches("```").count() == 1 => fence = Some("```"),
                None if line.starts_with("~~~") => fence = Some("~~~"),
                Some(open) if line.starts_with(open) => fence = None,
                _ => {}
            }
            if fence.is_some() {
                current.push(line);
                continue;
            }

            if let Some((level, title)) = self.heading(line) {
                flush(&mut current, &mut groups, &active);
                while stack.last().is_some_and(|(depth, _)| *depth >= level.depth) {
                    if let Some((_, label)) = stack.pop() {
                        active.remove(&label);
                    }
                }
                stack.push((level.depth, level.label.clone()));
                active.insert(level.label.clone(), title.to_string());
                current.push(line);
            } else if !line.is_empty() {
                current.push(line);
            } else {
                flush(&mut current, &mut groups, &active);
            }
        }
        flush(&mut current, &mut groups, &active);
        groups
    }
}

fn flush(current: &mut Vec<&str>, groups: &mut Vec<Fragment>, headings: &Meta) {
    if !current.is_empty() {
        groups.push(Fragment { content: current.join("\n"), headings: headings.clone() });
        current.clear();
    }
}

/// Joins consecutive groups sharing a heading context. A group that ends in a
/// bare heading absorbs the deeper scope that follows it.
fn merge_groups(groups: Vec<Fragment>) -> Vec<Fragment> {
    let mut merged: Vec<Fragment> = Vec::new();
    for group in groups {
        match merged.last_mut() {
            Some(last) if last.headings == group.headings => {
                last.content.push_str("  \n");
                last.content.push_str(&group.content);
            }
            Some(last) if last.headings.len() < group.headings.len() && ends_with_heading(&last.content) => {
                last.content.push_str("  \n");
                last.content.push_str(&group.content);
                last.headings = group.headings;
            }
            _ => merged.push(group),
        }
    }
    merged
}

fn ends_with_heading(content: &str) -> bool { content.lines().last().is_some_and(|l| l.starts_with('#')) }

impl StructureSplitter for MarkdownHeaderSplitter {
    fn split(&self, text: &str) -> Vec<Fragment> { merge_groups(self.line_groups(text)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECIPE: &str = "# 红烧肉的做法\n\n预估烹饪难度：★★★★\n\n## 必备原料和工具\n\n- 五花肉\n- 冰糖\n\n## 计算\n\n每份 500g\n\n## 操作\n\n### 焯水\n\n冷水下锅\n\n### 炖煮\n\n小火 60 分钟\n";

    fn h(pairs: &[(&str, &str)]) -> Meta { pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect() }

    #[test]
    fn splits_recipe_into_heading_scopes() {
        let fragments = MarkdownHeaderSplitter::default().split(RECIPE);
        let contents: Vec<&str> = fragments.iter().map(|f| f.content.as_str()).collect();
        assert_eq!(
            contents,
            vec![
                "# 红烧肉的做法  \n预估烹饪难度：★★★★",
                "## 必备原料和工具  \n- 五花肉\n- 冰糖",
                "## 计算  \n每份 500g",
                "## 操作  \n### 焯水  \n冷水下锅",
                "### 炖煮  \n小火 60 分钟",
            ]
        );
        assert_eq!(fragments[0].headings, h(&[("主标题", "红烧肉的做法")]));
        assert_eq!(fragments[1].headings, h(&[("主标题", "红烧肉的做法"), ("二级标题", "必备原料和工具")]));
        assert_eq!(
            fragments[4].headings,
            h(&[("主标题", "红烧肉的做法"), ("二级标题", "操作"), ("三级标题", "炖煮")])
        );
    }

    #[test]
    fn sibling_heading_closes_deeper_scopes() {
        let text = "# A\n## B\n### C\ntext\n## D\nmore";
        let fragments = MarkdownHeaderSplitter::default().split(text);
        let last = fragments.last().unwrap();
        assert_eq!(last.content, "## D\nmore");
        assert_eq!(last.headings, h(&[("主标题", "A"), ("二级标题", "D")]));
    }

    #[test]
    fn headings_in_code_fences_are_ignored() {
        let text = "# Title\nintro\n```sh\n# not a heading\n```\nafter";
        let fragments = MarkdownHeaderSplitter::default().split(text);
        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].content.contains("# not a heading"));
        assert!(fragments[0].content.ends_with("after"));
    }

    #[test]
    fn requires_space_after_marker() {
        let text = "#tag line\n#### too deep\nplain";
        let fragments = MarkdownHeaderSplitter::default().split(text);
        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].headings.is_empty());
    }

    #[test]
    fn text_before_first_heading_has_no_context() {
        let fragments = MarkdownHeaderSplitter::default().split("preface\n\n# Title\nbody");
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].content, "preface");
        assert!(fragments[0].headings.is_empty());
    }

    #[test]
    fn blank_input_has_no_fragments() {
        assert!(MarkdownHeaderSplitter::default().split("").is_empty());
        assert!(MarkdownHeaderSplitter::default().split("\n  \n\n").is_empty());
    }

    #[test]
    fn custom_levels() {
        let splitter = MarkdownHeaderSplitter::new(&[HeaderLevel { marker: "##".into(), label: "step".into() }]);
        let fragments = splitter.split("# Not split\nx\n## One\ny\n## Two\nz");
        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments[2].headings, h(&[("step", "Two")]));
    }
}
