/// Screens of the setup wizard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    PurchaseVerification,
    ApiKeys,
    /// Final confirmation screen, where the Firebase key is committed.
    Firebase,
}

impl WizardStep {
    pub const FIRST: WizardStep = WizardStep::PurchaseVerification;
    pub const LAST: WizardStep = WizardStep::Firebase;

    pub fn index(self) -> usize {
        match self {
            WizardStep::PurchaseVerification => 0,
            WizardStep::ApiKeys => 1,
            WizardStep::Firebase => 2,
        }
    }

    pub fn next(self) -> Self {
        match self {
            WizardStep::PurchaseVerification => WizardStep::ApiKeys,
            WizardStep::ApiKeys => WizardStep::Firebase,
            WizardStep::Firebase => WizardStep::Firebase,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            WizardStep::PurchaseVerification => WizardStep::PurchaseVerification,
            WizardStep::ApiKeys => WizardStep::PurchaseVerification,
            WizardStep::Firebase => WizardStep::ApiKeys,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::PurchaseVerification => "Purchase code",
            WizardStep::ApiKeys => "Google Maps API keys",
            WizardStep::Firebase => "Firebase",
        }
    }
}
