//! Button layout handed to the transport
//!
//! The store knows nothing about how options are shown. These types only
//! pair each option's label with the `<token>-<index>` payload a press must
//! carry back; the gateway turns them into its own widgets.

use crate::session::{ChoiceOption, SessionEntry};
use crate::token::{CallbackPayload, Token};
use serde::{Deserialize, Serialize};

/// A single pressable option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceButton {
    /// Text displayed to the user
    pub label: String,
    /// Payload delivered back when pressed
    pub callback_data: String,
}

impl ChoiceButton {
    pub fn new(label: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Rows of buttons for one interaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceKeyboard {
    pub rows: Vec<Vec<ChoiceButton>>,
}

impl ChoiceKeyboard {
    /// One button per row, in option order
    pub fn one_per_row(token: &Token, options: &[ChoiceOption]) -> Self {
        Self::with_columns(token, options, 1)
    }

    /// Buttons laid out left to right, `columns` per row
    ///
    /// A `columns` of 0 is treated as 1.
    pub fn with_columns(token: &Token, options: &[ChoiceOption], columns: usize) -> Self {
        let buttons: Vec<ChoiceButton> = options
            .iter()
            .enumerate()
            .map(|(index, option)| {
                ChoiceButton::new(
                    option.label.clone(),
                    CallbackPayload::new(token.clone(), index).encode(),
                )
            })
            .collect();

        Self {
            rows: buttons
                .chunks(columns.max(1))
                .map(|row| row.to_vec())
                .collect(),
        }
    }

    /// Keyboard for a stored session
    pub fn for_session(session: &SessionEntry) -> Self {
        Self::one_per_row(&session.token, &session.options)
    }

    pub fn buttons(&self) -> impl Iterator<Item = &ChoiceButton> {
        self.rows.iter().flatten()
    }
}
