use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;
use thiserror::Error;

#[cfg(test)]
#[path = "hostlist_test.rs"]
mod hostlist_test;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HostlistError {
    #[error("Unbalanced brackets in host expression {expr:?}.")]
    UnbalancedBrackets { expr: String },
    #[error("Bad numeric range {range:?} in host expression.")]
    BadRange { range: String },
}

/// An ordered list of host names. Duplicates are allowed; order is the order
/// of insertion (or of appearance in the parsed expression).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Hostlist {
    hosts: Vec<String>,
}

impl Hostlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a comma separated host expression, expanding bracketed numeric
    /// ranges. `node[01-03],login0` yields `node01,node02,node03,login0`.
    pub fn from_expr(expr: &str) -> Result<Self, HostlistError> {
        let mut hosts = Vec::new();
        for part in split_outside_brackets(expr)? {
            expand_part(&part, &mut hosts)?;
        }
        Ok(Self { hosts })
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { hosts: names.into_iter().map(Into::into).collect() }
    }

    pub fn push(&mut self, name: &str) {
        self.hosts.push(name.to_string());
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(String::as_str)
    }

    /// Renders the list back to its compressed form. Host names sharing a
    /// prefix with trailing digits are folded into bracketed ranges; only
    /// consecutive values are folded, the list is never reordered.
    pub fn ranged_string(&self) -> String {
        let mut groups: Vec<(String, Vec<Numbered>)> = Vec::new();
        for host in &self.hosts {
            match decompose(host) {
                Some((prefix, number)) => {
                    match groups.iter_mut().find(|(p, _)| p.as_str() == prefix) {
                        Some((_, numbers)) => numbers.push(number),
                        None => groups.push((prefix.to_string(), vec![number])),
                    }
                }
                None => groups.push((host.clone(), Vec::new())),
            }
        }
        groups.iter().map(|(prefix, numbers)| render_group(prefix, numbers)).join(",")
    }
}

impl fmt::Display for Hostlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ranged_string())
    }
}

impl<'a> IntoIterator for &'a Hostlist {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.hosts.iter()
    }
}

/// A deduplicated set of host names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostSet {
    names: BTreeSet<String>,
}

impl HostSet {
    pub fn from_expr(expr: &str) -> Result<Self, HostlistError> {
        let hostlist = Hostlist::from_expr(expr)?;
        Ok(Self { names: hostlist.hosts.into_iter().collect() })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Returns true if every host named by `expr` is a member of this set.
    pub fn contains_all(&self, expr: &str) -> Result<bool, HostlistError> {
        let queried = Hostlist::from_expr(expr)?;
        let result = queried.iter().all(|name| self.names.contains(name));
        Ok(result)
    }
}

/// A host name split into its prefix and trailing numeric index. The width
/// records the digit count so zero padding survives a round trip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Numbered {
    value: u64,
    width: usize,
}

impl Numbered {
    fn render(&self) -> String {
        format!("{:0width$}", self.value, width = self.width)
    }
}

fn split_outside_brackets(expr: &str) -> Result<Vec<String>, HostlistError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for ch in expr.chars() {
        match ch {
            '[' => {
                depth += 1;
                current.push(ch);
            }
            ']' => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    HostlistError::UnbalancedBrackets { expr: expr.to_string() }
                })?;
                current.push(ch);
            }
            ',' if depth == 0 => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }
    if depth != 0 {
        return Err(HostlistError::UnbalancedBrackets { expr: expr.to_string() });
    }
    if !current.is_empty() {
        parts.push(current);
    }
    Ok(parts)
}

fn expand_part(part: &str, hosts: &mut Vec<String>) -> Result<(), HostlistError> {
    let Some(open) = part.find('[') else {
        hosts.push(part.to_string());
        return Ok(());
    };
    let close = part
        .find(']')
        .ok_or_else(|| HostlistError::UnbalancedBrackets { expr: part.to_string() })?;
    if close < open {
        return Err(HostlistError::UnbalancedBrackets { expr: part.to_string() });
    }
    let prefix = &part[..open];
    let ranges = &part[open + 1..close];
    let suffix = &part[close + 1..];
    for range in ranges.split(',') {
        let (lo, hi) = parse_range(range)?;
        let width = padded_width(range);
        for value in lo..=hi {
            hosts.push(format!("{prefix}{value:0width$}{suffix}"));
        }
    }
    Ok(())
}

fn parse_range(range: &str) -> Result<(u64, u64), HostlistError> {
    let bad = || HostlistError::BadRange { range: range.to_string() };
    match range.split_once('-') {
        Some((lo, hi)) => {
            let lo = lo.parse::<u64>().map_err(|_| bad())?;
            let hi = hi.parse::<u64>().map_err(|_| bad())?;
            if lo > hi {
                return Err(bad());
            }
            Ok((lo, hi))
        }
        None => {
            let value = range.parse::<u64>().map_err(|_| bad())?;
            Ok((value, value))
        }
    }
}

/// Zero padding applies when the low bound is written with leading zeros.
fn padded_width(range: &str) -> usize {
    let lo = range.split('-').next().unwrap_or(range);
    if lo.len() > 1 && lo.starts_with('0') { lo.len() } else { 0 }
}

fn decompose(host: &str) -> Option<(&str, Numbered)> {
    let digits = host.chars().rev().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let split = host.len() - digits;
    if split == 0 {
        // All-digit names are left alone rather than grouped under an empty
        // prefix.
        return None;
    }
    let suffix = &host[split..];
    let value = suffix.parse::<u64>().ok()?;
    let width = if suffix.len() > 1 && suffix.starts_with('0') { suffix.len() } else { 0 };
    Some((&host[..split], Numbered { value, width }))
}

fn render_group(prefix: &str, numbers: &[Numbered]) -> String {
    match numbers {
        [] => prefix.to_string(),
        [single] => format!("{prefix}{}", single.render()),
        _ => {
            let mut ranges: Vec<String> = Vec::new();
            let mut run_start = numbers[0];
            let mut run_end = numbers[0];
            for number in &numbers[1..] {
                let consecutive =
                    number.value == run_end.value + 1 && number.width == run_end.width;
                if consecutive {
                    run_end = *number;
                } else {
                    ranges.push(render_run(run_start, run_end));
                    run_start = *number;
                    run_end = *number;
                }
            }
            ranges.push(render_run(run_start, run_end));
            format!("{prefix}[{}]", ranges.join(","))
        }
    }
}

fn render_run(start: Numbered, end: Numbered) -> String {
    if start.value == end.value {
        start.render()
    } else {
        format!("{}-{}", start.render(), end.render())
    }
}
