pub const BINARY_LABELS: [&str; 2] = ["Benign", "Malignant"];

pub const MULTICLASS_LABELS: [&str; 8] = [
    "Actinic Keratosis",
    "Basal Cell Carcinoma",
    "Benign Keratosis-like Lesions",
    "Dermatofibroma",
    "Melanoma",
    "Melanocytic Nevus",
    "Squamous Cell Carcinoma",
    "Vascular Lesions",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionKind {
    Binary,
    Multiclass,
}

impl PredictionKind {
    pub fn from_len(len: usize) -> Option<Self> {
        match len {
            2 => Some(Self::Binary),
            8 => Some(Self::Multiclass),
            _ => None,
        }
    }

    pub fn labels(self) -> &'static [&'static str] {
        match self {
            Self::Binary => &BINARY_LABELS,
            Self::Multiclass => &MULTICLASS_LABELS,
        }
    }
}

/// Label/score pairs in label-table order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabeledPrediction {
    entries: Vec<(&'static str, f64)>,
}

impl LabeledPrediction {
    pub fn entries(&self) -> &[(&'static str, f64)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn kind(&self) -> Option<PredictionKind> {
        PredictionKind::from_len(self.entries.len())
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, score)| *score)
    }

    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(label, _)| *label)
    }

    pub fn scores(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|(_, score)| *score)
    }

    /// Highest score first; equal scores keep table order.
    pub fn sorted_desc(&self) -> Vec<(&'static str, f64)> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.1.total_cmp(&a.1));
        sorted
    }
}

/// Maps a raw score vector onto the label table selected by its length.
///
/// Only lengths 2 and 8 are recognised; anything else yields an empty result
/// and callers are expected to render that as "no prediction".
pub fn interpret_prediction(data: &[f64]) -> LabeledPrediction {
    let Some(kind) = PredictionKind::from_len(data.len()) else {
        return LabeledPrediction::default();
    };
    let entries = kind
        .labels()
        .iter()
        .copied()
        .zip(data.iter().copied())
        .collect();
    LabeledPrediction { entries }
}

/// Returns the label with the largest score. The first label wins ties and
/// `NaN` scores never win.
pub fn label_with_biggest_value(prediction: &LabeledPrediction) -> Option<&'static str> {
    let mut best: Option<(&'static str, f64)> = None;
    for &(label, score) in prediction.entries() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, max)) if score <= max => {}
            _ => best = Some((label, score)),
        }
    }
    best.map(|(label, _)| label)
}

pub fn predicted_class(data: &[f64]) -> Option<&'static str> {
    label_with_biggest_value(&interpret_prediction(data))
}

pub fn format_score(score: f64) -> String {
    format!("{:.2}%", score * 100.0)
}
