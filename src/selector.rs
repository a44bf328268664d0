use crate::dom::{Dom, NodeId};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectorAttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SelectorStep {
    pub(crate) tag: Option<String>,
    pub(crate) universal: bool,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attrs: Vec<SelectorAttrCondition>,
}

impl SelectorStep {
    fn is_empty(&self) -> bool {
        !self.universal
            && self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
    }

    pub(crate) fn id_only(&self) -> Option<&str> {
        if self.tag.is_none() && !self.universal && self.classes.is_empty() && self.attrs.is_empty()
        {
            self.id.as_deref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Combinator {
    Descendant,
    Child,
}

/// One compound step plus its relation to the preceding step. The first
/// part of a chain carries `Descendant`, which matching ignores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorPart {
    pub(crate) combinator: Combinator,
    pub(crate) step: SelectorStep,
}

pub(crate) fn parse_selector_groups(selector: &str) -> Result<Vec<Vec<SelectorPart>>> {
    split_top_level_groups(selector)
        .into_iter()
        .map(|group| parse_group(selector, &group))
        .collect()
}

// Splits on commas that are not inside brackets or quotes.
fn split_top_level_groups(selector: &str) -> Vec<String> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut in_brackets = false;
    let mut quote: Option<char> = None;
    for ch in selector.chars() {
        match ch {
            '"' | '\'' => {
                if quote == Some(ch) {
                    quote = None;
                } else if quote.is_none() {
                    quote = Some(ch);
                }
                current.push(ch);
            }
            '[' if quote.is_none() => {
                in_brackets = true;
                current.push(ch);
            }
            ']' if quote.is_none() => {
                in_brackets = false;
                current.push(ch);
            }
            ',' if quote.is_none() && !in_brackets => {
                groups.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    groups.push(current);
    groups
}

fn parse_group(original: &str, group: &str) -> Result<Vec<SelectorPart>> {
    let chars: Vec<char> = group.chars().collect();
    let mut parts = Vec::new();
    let mut i = 0usize;
    let mut pending = Combinator::Descendant;

    while i < chars.len() {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() {
            break;
        }
        match chars[i] {
            '>' => {
                if parts.is_empty() {
                    return Err(Error::UnsupportedSelector(original.to_string()));
                }
                pending = Combinator::Child;
                i += 1;
            }
            '+' | '~' => {
                return Err(Error::UnsupportedSelector(original.to_string()));
            }
            _ => {
                let step = parse_step(original, &chars, &mut i)?;
                parts.push(SelectorPart {
                    combinator: pending,
                    step,
                });
                pending = Combinator::Descendant;
            }
        }
    }

    if parts.is_empty() || pending == Combinator::Child {
        return Err(Error::UnsupportedSelector(original.to_string()));
    }
    Ok(parts)
}

fn parse_step(original: &str, chars: &[char], i: &mut usize) -> Result<SelectorStep> {
    let mut step = SelectorStep::default();
    loop {
        match chars.get(*i) {
            Some('*') if step.is_empty() => {
                step.universal = true;
                *i += 1;
            }
            Some('#') => {
                *i += 1;
                let name = parse_identifier(chars, i);
                if name.is_empty() {
                    return Err(Error::UnsupportedSelector(original.to_string()));
                }
                step.id = Some(name);
            }
            Some('.') => {
                *i += 1;
                let name = parse_identifier(chars, i);
                if name.is_empty() {
                    return Err(Error::UnsupportedSelector(original.to_string()));
                }
                step.classes.push(name);
            }
            Some('[') => {
                *i += 1;
                step.attrs.push(parse_attr_condition(original, chars, i)?);
            }
            Some(':') => {
                return Err(Error::UnsupportedSelector(original.to_string()));
            }
            Some(&ch) if is_identifier_char(ch) => {
                if !step.is_empty() {
                    return Err(Error::UnsupportedSelector(original.to_string()));
                }
                step.tag = Some(parse_identifier(chars, i));
            }
            _ => break,
        }
    }
    if step.is_empty() {
        return Err(Error::UnsupportedSelector(original.to_string()));
    }
    Ok(step)
}

fn parse_attr_condition(
    original: &str,
    chars: &[char],
    i: &mut usize,
) -> Result<SelectorAttrCondition> {
    while chars.get(*i).is_some_and(|ch| ch.is_whitespace()) {
        *i += 1;
    }
    let key = parse_identifier(chars, i);
    if key.is_empty() {
        return Err(Error::UnsupportedSelector(original.to_string()));
    }
    while chars.get(*i).is_some_and(|ch| ch.is_whitespace()) {
        *i += 1;
    }
    match chars.get(*i) {
        Some(']') => {
            *i += 1;
            Ok(SelectorAttrCondition::Exists { key })
        }
        Some('=') => {
            *i += 1;
            let value = parse_attr_value(original, chars, i)?;
            while chars.get(*i).is_some_and(|ch| ch.is_whitespace()) {
                *i += 1;
            }
            if chars.get(*i) != Some(&']') {
                return Err(Error::UnsupportedSelector(original.to_string()));
            }
            *i += 1;
            Ok(SelectorAttrCondition::Eq { key, value })
        }
        // ~=, ^=, $=, *=, |= and friends are out of scope.
        _ => Err(Error::UnsupportedSelector(original.to_string())),
    }
}

fn parse_attr_value(original: &str, chars: &[char], i: &mut usize) -> Result<String> {
    while chars.get(*i).is_some_and(|ch| ch.is_whitespace()) {
        *i += 1;
    }
    match chars.get(*i) {
        Some(&quote @ ('"' | '\'')) => {
            *i += 1;
            let start = *i;
            while *i < chars.len() && chars[*i] != quote {
                *i += 1;
            }
            if *i >= chars.len() {
                return Err(Error::UnsupportedSelector(original.to_string()));
            }
            let value: String = chars[start..*i].iter().collect();
            *i += 1;
            Ok(value)
        }
        Some(_) => {
            let start = *i;
            while *i < chars.len() && chars[*i] != ']' && !chars[*i].is_whitespace() {
                *i += 1;
            }
            Ok(chars[start..*i].iter().collect())
        }
        None => Err(Error::UnsupportedSelector(original.to_string())),
    }
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-' || ch == '_'
}

fn parse_identifier(chars: &[char], i: &mut usize) -> String {
    let start = *i;
    while *i < chars.len() && is_identifier_char(chars[*i]) {
        *i += 1;
    }
    chars[start..*i].iter().collect()
}

pub(crate) fn matches_step(dom: &Dom, node: NodeId, step: &SelectorStep) -> bool {
    let Some(element) = dom.element(node) else {
        return false;
    };
    if let Some(tag) = &step.tag {
        if !element.tag_name.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if let Some(id) = &step.id {
        if element.attrs.get("id").map(String::as_str) != Some(id.as_str()) {
            return false;
        }
    }
    if step
        .classes
        .iter()
        .any(|class| !dom.has_class(node, class))
    {
        return false;
    }
    step.attrs.iter().all(|condition| match condition {
        SelectorAttrCondition::Exists { key } => element.attrs.contains_key(key),
        SelectorAttrCondition::Eq { key, value } => {
            element.attrs.get(key).map(String::as_str) == Some(value.as_str())
        }
    })
}

pub(crate) fn matches_chain(dom: &Dom, node: NodeId, parts: &[SelectorPart]) -> bool {
    let Some((last, rest)) = parts.split_last() else {
        return false;
    };
    if !matches_step(dom, node, &last.step) {
        return false;
    }
    matches_ancestors(dom, node, rest, last.combinator)
}

fn matches_ancestors(
    dom: &Dom,
    node: NodeId,
    parts: &[SelectorPart],
    combinator: Combinator,
) -> bool {
    let Some((prev, rest)) = parts.split_last() else {
        return true;
    };
    match combinator {
        Combinator::Child => {
            let Some(parent) = dom.parent(node) else {
                return false;
            };
            matches_step(dom, parent, &prev.step)
                && matches_ancestors(dom, parent, rest, prev.combinator)
        }
        Combinator::Descendant => {
            let mut cursor = dom.parent(node);
            while let Some(ancestor) = cursor {
                if matches_step(dom, ancestor, &prev.step)
                    && matches_ancestors(dom, ancestor, rest, prev.combinator)
                {
                    return true;
                }
                cursor = dom.parent(ancestor);
            }
            false
        }
    }
}

impl Dom {
    pub(crate) fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let groups = parse_selector_groups(selector)?;

        if groups.len() == 1 && groups[0].len() == 1 {
            if let Some(id) = groups[0][0].step.id_only() {
                return Ok(self.by_id(id).into_iter().collect());
            }
        }

        let mut ids = Vec::new();
        self.collect_elements_dfs(self.root(), &mut ids);

        Ok(ids
            .into_iter()
            .filter(|&candidate| {
                groups
                    .iter()
                    .any(|parts| matches_chain(self, candidate, parts))
            })
            .collect())
    }

    pub(crate) fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }
}
