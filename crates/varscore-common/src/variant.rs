//! Core record types shared by every stage of the variant scoring pipeline.
//! A `VariantRecord` is created once per parse pass; downstream stages only
//! touch the derived fields (group, control flag, composite score).

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Feature components
// ---------------------------------------------------------------------------

/// The six named sub-scores that make up a rank score.
/// Declaration order is the fixed component order used everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FeatureComponent {
    /// Allele-frequency penalty
    #[serde(rename = "AF")]
    AlleleFrequency,
    /// Protein-prediction score (SIFT/PolyPhen style)
    #[serde(rename = "PP")]
    ProteinPrediction,
    /// Consequence-severity score
    #[serde(rename = "CON")]
    Consequence,
    /// Variant-call-quality score
    #[serde(rename = "VCQF")]
    CallQuality,
    /// Linkage score
    #[serde(rename = "LIN")]
    Linkage,
    /// Clinical-significance score
    #[serde(rename = "CLIN")]
    ClinicalSignificance,
}

impl FeatureComponent {
    pub const ALL: [FeatureComponent; 6] = [
        FeatureComponent::AlleleFrequency,
        FeatureComponent::ProteinPrediction,
        FeatureComponent::Consequence,
        FeatureComponent::CallQuality,
        FeatureComponent::Linkage,
        FeatureComponent::ClinicalSignificance,
    ];

    /// Short column code, e.g. "VCQF".
    pub fn code(&self) -> &'static str {
        match self {
            FeatureComponent::AlleleFrequency      => "AF",
            FeatureComponent::ProteinPrediction    => "PP",
            FeatureComponent::Consequence          => "CON",
            FeatureComponent::CallQuality          => "VCQF",
            FeatureComponent::Linkage              => "LIN",
            FeatureComponent::ClinicalSignificance => "CLIN",
        }
    }

    /// Parse a column code, case-insensitive.
    pub fn from_code(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "AF"   => Some(FeatureComponent::AlleleFrequency),
            "PP"   => Some(FeatureComponent::ProteinPrediction),
            "CON"  => Some(FeatureComponent::Consequence),
            "VCQF" => Some(FeatureComponent::CallQuality),
            "LIN"  => Some(FeatureComponent::Linkage),
            "CLIN" => Some(FeatureComponent::ClinicalSignificance),
            _      => None,
        }
    }

    /// Position in the fixed component order.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for FeatureComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Per-variant feature component values. `None` means the value was
/// missing or non-numeric in the source table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureScores {
    pub allele_frequency: Option<f64>,
    pub protein_prediction: Option<f64>,
    pub consequence: Option<f64>,
    pub call_quality: Option<f64>,
    pub linkage: Option<f64>,
    pub clinical_significance: Option<f64>,
}

impl FeatureScores {
    /// All six components present.
    pub fn complete(af: f64, pp: f64, con: f64, vcqf: f64, lin: f64, clin: f64) -> Self {
        Self {
            allele_frequency: Some(af),
            protein_prediction: Some(pp),
            consequence: Some(con),
            call_quality: Some(vcqf),
            linkage: Some(lin),
            clinical_significance: Some(clin),
        }
    }

    pub fn get(&self, component: FeatureComponent) -> Option<f64> {
        match component {
            FeatureComponent::AlleleFrequency      => self.allele_frequency,
            FeatureComponent::ProteinPrediction    => self.protein_prediction,
            FeatureComponent::Consequence          => self.consequence,
            FeatureComponent::CallQuality          => self.call_quality,
            FeatureComponent::Linkage              => self.linkage,
            FeatureComponent::ClinicalSignificance => self.clinical_significance,
        }
    }

    pub fn set(&mut self, component: FeatureComponent, value: Option<f64>) {
        let slot = match component {
            FeatureComponent::AlleleFrequency      => &mut self.allele_frequency,
            FeatureComponent::ProteinPrediction    => &mut self.protein_prediction,
            FeatureComponent::Consequence          => &mut self.consequence,
            FeatureComponent::CallQuality          => &mut self.call_quality,
            FeatureComponent::Linkage              => &mut self.linkage,
            FeatureComponent::ClinicalSignificance => &mut self.clinical_significance,
        };
        *slot = value;
    }

    /// Convert to array in component order.
    pub fn as_array(&self) -> [Option<f64>; 6] {
        [
            self.allele_frequency,
            self.protein_prediction,
            self.consequence,
            self.call_quality,
            self.linkage,
            self.clinical_significance,
        ]
    }

    /// Components that are missing or not finite.
    pub fn missing(&self) -> Vec<FeatureComponent> {
        FeatureComponent::ALL
            .into_iter()
            .filter(|c| !self.get(*c).is_some_and(f64::is_finite))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Group label
// ---------------------------------------------------------------------------

/// Analysis bucket assigned from the raw clinical-significance annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupLabel {
    Benign,
    Pathogenic,
    Uncertain,
    Other,
    /// A positive control that would otherwise have landed in `Other`.
    ControlUncertain,
}

impl GroupLabel {
    pub const ALL: [GroupLabel; 5] = [
        GroupLabel::Benign,
        GroupLabel::Pathogenic,
        GroupLabel::Uncertain,
        GroupLabel::Other,
        GroupLabel::ControlUncertain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupLabel::Benign           => "benign",
            GroupLabel::Pathogenic       => "pathogenic",
            GroupLabel::Uncertain        => "uncertain",
            GroupLabel::Other            => "other",
            GroupLabel::ControlUncertain => "control_uncertain",
        }
    }

    /// Parse a group name as written in a label-mapping table.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "benign"            => Some(GroupLabel::Benign),
            "pathogenic"        => Some(GroupLabel::Pathogenic),
            "uncertain"         => Some(GroupLabel::Uncertain),
            "other"             => Some(GroupLabel::Other),
            "control_uncertain" => Some(GroupLabel::ControlUncertain),
            _                   => None,
        }
    }

    /// Binary ground truth: pathogenic → true, benign → false, anything else
    /// takes no part in classification evaluation.
    pub fn ground_truth(&self) -> Option<bool> {
        match self {
            GroupLabel::Pathogenic => Some(true),
            GroupLabel::Benign     => Some(false),
            _                      => None,
        }
    }
}

impl std::fmt::Display for GroupLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Variant record
// ---------------------------------------------------------------------------

/// One parsed variant with its derived analysis fields.
///
/// Identity fields are private so they cannot change after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantRecord {
    chrom: String,
    pos: u64,
    reference: String,
    alternate: String,

    pub gene: String,
    pub consequence: String,
    pub impact: String,
    pub features: FeatureScores,
    /// Raw CLNSIG annotation as parsed.
    pub clinical_significance: String,
    /// Rank score supplied by the upstream scorer.
    pub rank_score: Option<f64>,

    /// Written by the score composer.
    pub composite_score: Option<f64>,
    /// Set once the composer has visited the record, even when it left no
    /// composite. From then on `rank_score` no longer stands in for it.
    #[serde(default)]
    composed: bool,
    /// Written by the group classifier.
    pub group: Option<GroupLabel>,
    /// Written by control marking.
    pub is_control: bool,
}

impl VariantRecord {
    pub fn new(
        chrom: impl Into<String>,
        pos: u64,
        reference: impl Into<String>,
        alternate: impl Into<String>,
    ) -> Self {
        Self {
            chrom: chrom.into(),
            pos,
            reference: reference.into(),
            alternate: alternate.into(),
            gene: String::new(),
            consequence: String::new(),
            impact: String::new(),
            features: FeatureScores::default(),
            clinical_significance: String::new(),
            rank_score: None,
            composite_score: None,
            composed: false,
            group: None,
            is_control: false,
        }
    }

    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    pub fn pos(&self) -> u64 {
        self.pos
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn alternate(&self) -> &str {
        &self.alternate
    }

    /// Key used for positive-control matching, e.g. "17_7579472".
    pub fn chrom_pos(&self) -> String {
        format!("{}_{}", self.chrom, self.pos)
    }

    /// Stable record key, e.g. "17_7579472_G_C".
    pub fn variant_id(&self) -> String {
        format!("{}_{}_{}_{}", self.chrom, self.pos, self.reference, self.alternate)
    }

    /// Record the composer's result. A `None` here is final: the record is
    /// unscored until it is composed again.
    pub fn set_composite(&mut self, score: Option<f64>) {
        self.composite_score = score;
        self.composed = true;
    }

    pub fn is_composed(&self) -> bool {
        self.composed
    }

    /// Score used by evaluation and aggregation. The composite wins when
    /// present. The upstream rank score is used only for records the composer
    /// never visited, since it was computed under a different weighting.
    /// Non-finite values count as missing.
    pub fn score(&self) -> Option<f64> {
        let score = match self.composite_score {
            Some(s) => Some(s),
            None if self.composed => None,
            None => self.rank_score,
        };
        score.filter(|s| s.is_finite())
    }

    /// Gene symbol, or `None` when the record cannot be attributed to a gene.
    pub fn gene_symbol(&self) -> Option<&str> {
        let g = self.gene.trim();
        if g.is_empty() { None } else { Some(g) }
    }
}
