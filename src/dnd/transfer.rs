use tracing::debug;

/// Payload of an in-flight drag. Identifies the source instance and group,
/// and the panel when a single tab is dragged rather than a whole group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanelTransfer {
    pub instance_id: String,
    pub group_id: String,
    /// `None` for whole-group drags.
    pub panel_id: Option<String>,
}

impl PanelTransfer {
    pub fn panel(
        instance_id: impl Into<String>,
        group_id: impl Into<String>,
        panel_id: impl Into<String>,
    ) -> Self {
        PanelTransfer {
            instance_id: instance_id.into(),
            group_id: group_id.into(),
            panel_id: Some(panel_id.into()),
        }
    }

    pub fn group(instance_id: impl Into<String>, group_id: impl Into<String>) -> Self {
        PanelTransfer {
            instance_id: instance_id.into(),
            group_id: group_id.into(),
            panel_id: None,
        }
    }
}

/// The single exclusive payload slot. At most one drag exists at a time;
/// starting a new one overwrites whatever was left behind by a gesture that
/// never delivered its drop.
#[derive(Debug, Default)]
pub struct TransferSlot {
    current: Option<PanelTransfer>,
}

impl TransferSlot {
    pub fn begin(&mut self, transfer: PanelTransfer) {
        if let Some(stale) = self.current.replace(transfer) {
            debug!(?stale, "overwriting undelivered drag payload");
        }
    }

    pub fn peek(&self) -> Option<&PanelTransfer> {
        self.current.as_ref()
    }

    pub fn take(&mut self) -> Option<PanelTransfer> {
        self.current.take()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }
}
