//! Clinical-significance grouping and positive-control marking.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use varscore_common::{GroupLabel, Result, VarscoreError, VariantRecord};

/// Validated label-mapping table: raw CLNSIG string → group.
#[derive(Debug, Clone)]
pub struct LabelMapping {
    index: HashMap<String, GroupLabel>,
}

impl LabelMapping {
    /// Build from a group name → accepted raw labels table.
    ///
    /// Accepted labels are trimmed. Fails when the table is empty, a group
    /// name is unknown, or a raw label is listed under two groups.
    pub fn new(table: &BTreeMap<String, Vec<String>>) -> Result<Self> {
        if table.is_empty() {
            return Err(VarscoreError::config("label mapping table is empty"));
        }

        let mut index = HashMap::new();
        for (name, labels) in table {
            let group = GroupLabel::from_name(name).ok_or_else(|| {
                VarscoreError::config(format!("unknown group '{name}' in label mapping"))
            })?;
            for raw in labels {
                let raw = raw.trim().to_string();
                if let Some(previous) = index.insert(raw.clone(), group) {
                    if previous != group {
                        return Err(VarscoreError::config(format!(
                            "label '{raw}' is mapped to both '{previous}' and '{group}'"
                        )));
                    }
                }
            }
        }

        if index.is_empty() {
            return Err(VarscoreError::config("label mapping table has no labels"));
        }
        Ok(Self { index })
    }

    /// Exact, case-sensitive lookup of an already trimmed label.
    pub fn lookup(&self, raw: &str) -> Option<GroupLabel> {
        self.index.get(raw).copied()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Outcome of a classification pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationSummary {
    pub counts: BTreeMap<GroupLabel, usize>,
    /// Raw labels that matched no group, with how often each was seen
    pub unmatched: BTreeMap<String, usize>,
}

#[derive(Debug, Clone)]
pub struct GroupClassifier {
    mapping: LabelMapping,
}

impl GroupClassifier {
    pub fn new(mapping: LabelMapping) -> Self {
        Self { mapping }
    }

    pub fn from_table(table: &BTreeMap<String, Vec<String>>) -> Result<Self> {
        LabelMapping::new(table).map(Self::new)
    }

    /// Group for one raw annotation; unmatched labels fall into `Other`.
    pub fn group_for(&self, raw: &str) -> Option<GroupLabel> {
        self.mapping.lookup(raw.trim())
    }

    /// Assign a group to every record. Unmatched labels become `Other` and
    /// are reported, never dropped.
    pub fn classify(&self, records: &mut [VariantRecord]) -> ClassificationSummary {
        let mut summary = ClassificationSummary::default();

        for record in records.iter_mut() {
            let raw = record.clinical_significance.trim();
            let group = match self.mapping.lookup(raw) {
                Some(g) => g,
                None => {
                    *summary.unmatched.entry(raw.to_string()).or_default() += 1;
                    GroupLabel::Other
                }
            };
            record.group = Some(group);
            *summary.counts.entry(group).or_default() += 1;
        }

        for (label, n) in &summary.unmatched {
            warn!(label = %label, count = n, "Unmatched clinical significance, grouped as other");
        }
        info!(
            records = records.len(),
            groups = ?summary.counts,
            unmatched = summary.unmatched.len(),
            "Variants classified"
        );
        summary
    }
}

/// Set of chromosome-position keys of known positive controls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlSet {
    keys: HashSet<String>,
}

impl ControlSet {
    /// Fails with a configuration error when no keys are given.
    pub fn new<I, S>(keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys: HashSet<String> = keys
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if keys.is_empty() {
            return Err(VarscoreError::config("positive control set is empty"));
        }
        Ok(Self { keys })
    }

    pub fn contains(&self, chrom_pos: &str) -> bool {
        self.keys.contains(chrom_pos)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Flag every record whose chrom_pos key is a control. With
/// `relabel_uncertain`, controls grouped as `Other` move to
/// `ControlUncertain`; a `ControlUncertain` left from an earlier call goes
/// back to `Other` when the record no longer qualifies. Returns the number of
/// records flagged.
pub fn mark_controls(
    records: &mut [VariantRecord],
    controls: &ControlSet,
    relabel_uncertain: bool,
) -> usize {
    let mut marked = 0;
    let mut relabelled = 0;
    for record in records.iter_mut() {
        record.is_control = controls.contains(&record.chrom_pos());
        let relabel = record.is_control && relabel_uncertain;
        match record.group {
            Some(GroupLabel::Other) if relabel => {
                record.group = Some(GroupLabel::ControlUncertain);
                relabelled += 1;
            }
            Some(GroupLabel::ControlUncertain) if !relabel => {
                record.group = Some(GroupLabel::Other);
            }
            Some(GroupLabel::ControlUncertain) => relabelled += 1,
            _ => {}
        }
        if record.is_control {
            marked += 1;
        }
    }
    info!(marked, relabelled, controls = controls.len(), "Positive controls marked");
    marked
}

/// Number of records per group over classified records.
pub fn group_counts(records: &[VariantRecord]) -> BTreeMap<GroupLabel, usize> {
    let mut counts = BTreeMap::new();
    for g in records.iter().filter_map(|r| r.group) {
        *counts.entry(g).or_default() += 1;
    }
    counts
}
