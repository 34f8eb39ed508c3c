//! Subscription frequencies and the plan selector.

use serde::{Deserialize, Serialize};

use crate::notify::Notice;

/// All subscription tiers offered on the pricing grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
}

impl Frequency {
    /// Parse the `data-freq` tag carried by a plan card.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "biweekly" => Some(Self::Biweekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Daily => "Daily Updates",
            Self::Weekly => "Weekly Intelligence",
            Self::Biweekly => "Twice a Month",
            Self::Monthly => "Monthly Strategic",
        }
    }
}

/// A plan card: the frequency tag and the price it declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanControl {
    pub frequency: Frequency,
    pub price: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanCatalog {
    controls: Vec<PlanControl>,
}

impl Default for PlanCatalog {
    fn default() -> Self {
        PlanCatalog::new(vec![
            PlanControl {
                frequency: Frequency::Daily,
                price: 1999,
            },
            PlanControl {
                frequency: Frequency::Weekly,
                price: 699,
            },
            PlanControl {
                frequency: Frequency::Biweekly,
                price: 349,
            },
            PlanControl {
                frequency: Frequency::Monthly,
                price: 999,
            },
        ])
    }
}

impl PlanCatalog {
    pub fn new(controls: Vec<PlanControl>) -> Self {
        PlanCatalog { controls }
    }

    pub fn controls(&self) -> &[PlanControl] {
        &self.controls
    }

    pub fn find(&self, frequency: Frequency) -> Option<PlanControl> {
        self.controls
            .iter()
            .copied()
            .find(|c| c.frequency == frequency)
    }
}

/// The summary shown next to the payment block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectedPlan {
    pub frequency: Frequency,
    pub label: &'static str,
    pub price: u32,
}

impl From<PlanControl> for SelectedPlan {
    fn from(control: PlanControl) -> Self {
        SelectedPlan {
            frequency: control.frequency,
            label: control.frequency.label(),
            price: control.price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionOutcome {
    pub selected: SelectedPlan,
    pub notice: Notice,
}

/// Holds the single active plan.
#[derive(Debug, Clone)]
pub struct PlanSelector {
    catalog: PlanCatalog,
    active: PlanControl,
}

impl PlanSelector {
    /// Starts on the biweekly card, or the first card when the catalog has
    /// no biweekly tier. Returns `None` for an empty catalog.
    pub fn new(catalog: PlanCatalog) -> Option<Self> {
        let active = catalog
            .find(Frequency::Biweekly)
            .or_else(|| catalog.controls().first().copied())?;
        Some(PlanSelector { catalog, active })
    }

    pub fn selected(&self) -> SelectedPlan {
        self.active.into()
    }

    /// Activate the card tagged `tag`. Unknown tags leave the selection as
    /// it was and produce nothing.
    pub fn select(&mut self, tag: &str) -> Option<SelectionOutcome> {
        let control = Frequency::from_tag(tag).and_then(|f| self.catalog.find(f))?;
        self.active = control;

        let selected = self.selected();
        Some(SelectionOutcome {
            selected,
            notice: Notice::success(format!(
                "{} plan selected: {} USDT",
                selected.label, selected.price
            )),
        })
    }

    /// One flag per card, in catalog order.
    pub fn active_flags(&self) -> Vec<(PlanControl, bool)> {
        self.catalog
            .controls()
            .iter()
            .map(|c| (*c, c.frequency == self.active.frequency))
            .collect()
    }

    pub fn proceed_to_payment(&self) -> Notice {
        Notice::success(format!("Proceeding with {} plan", self.active.frequency.label()))
    }
}
