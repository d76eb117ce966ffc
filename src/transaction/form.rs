//! The fields shared by the new and edit transaction forms.

use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    html::{
        FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE,
    },
    transaction::{Amount, TransactionFields, TransactionKind},
};

/// The raw data entered in a transaction form.
///
/// Read with axum_extra's `Form`, which turns an empty date into `None`
/// instead of rejecting the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionForm {
    pub kind: TransactionKind,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub description: String,
    pub date: Option<Date>,
}

impl TransactionForm {
    /// Check the form before anything is sent to the store.
    ///
    /// # Errors
    ///
    /// Returns [Error::MissingFields] if the amount, description or date is
    /// empty, otherwise the errors of [Amount::parse].
    pub fn validate(&self) -> Result<TransactionFields, Error> {
        let description = self.description.trim();

        let Some(date) = self.date else {
            return Err(Error::MissingFields);
        };

        if description.is_empty() || self.amount.trim().is_empty() {
            return Err(Error::MissingFields);
        }

        Ok(TransactionFields {
            kind: self.kind,
            amount: Amount::parse(&self.amount)?,
            description: description.to_owned(),
            date,
        })
    }
}

/// The values a transaction form starts with.
pub struct TransactionFormDefaults<'a> {
    pub kind: TransactionKind,
    pub amount: Option<Amount>,
    pub date: Date,
    pub description: Option<&'a str>,
    pub autofocus_amount: bool,
}

pub fn transaction_form_fields(defaults: &TransactionFormDefaults<'_>) -> Markup {
    let is_expense = matches!(defaults.kind, TransactionKind::Expense);
    let amount = defaults.amount.map(|amount| amount.to_string());

    html! {
        fieldset class="space-y-2"
        {
            legend class=(FORM_LABEL_STYLE) { "Type" }

            div class=(FORM_RADIO_GROUP_STYLE)
            {
                div class="flex items-center gap-3"
                {
                    input
                        name="kind"
                        id="kind-expense"
                        type="radio"
                        value=(TransactionKind::Expense.as_str())
                        checked[is_expense]
                        required
                        tabindex="0"
                        class=(FORM_RADIO_INPUT_STYLE);

                    label for="kind-expense" class=(FORM_RADIO_LABEL_STYLE)
                    {
                        "Expense"
                    }
                }

                div class="flex items-center gap-3"
                {
                    input
                        name="kind"
                        id="kind-income"
                        type="radio"
                        value=(TransactionKind::Income.as_str())
                        checked[!is_expense]
                        required
                        tabindex="0"
                        class=(FORM_RADIO_INPUT_STYLE);

                    label for="kind-income" class=(FORM_RADIO_LABEL_STYLE)
                    {
                        "Income"
                    }
                }
            }
        }

        div
        {
            label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

            input
                name="amount"
                id="amount"
                type="number"
                step="0.01"
                min="0"
                placeholder="0.00"
                required
                value=[amount.as_deref()]
                autofocus[defaults.autofocus_amount]
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="date" class=(FORM_LABEL_STYLE) { "Date" }

            input
                name="date"
                id="date"
                type="date"
                value=(defaults.date)
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="description" class=(FORM_LABEL_STYLE) { "Description" }

            input
                name="description"
                id="description"
                type="text"
                placeholder="e.g. Groceries"
                required
                value=[defaults.description]
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}


#[cfg(test)]
mod fields_tests {
    use scraper::{Html, Selector};
    use time::macros::date;

    use super::{TransactionFormDefaults, transaction_form_fields};
    use crate::transaction::{Amount, TransactionKind};

    #[test]
    fn checks_selected_kind() {
        let cases = [
            (TransactionKind::Expense, "expense"),
            (TransactionKind::Income, "income"),
        ];

        for (kind, expected) in cases {
            let html = render_fields(kind, None);
            assert_checked_value(&html, expected);
        }
    }

    #[test]
    fn fills_in_amount_with_two_decimal_places() {
        let html = render_fields(TransactionKind::Income, Some(Amount::parse("7.5").unwrap()));

        let amount = html
            .select(&Selector::parse("input#amount").unwrap())
            .next()
            .unwrap();
        assert_eq!(amount.value().attr("value"), Some("7.50"));
    }

    fn render_fields(kind: TransactionKind, amount: Option<Amount>) -> Html {
        let fields = transaction_form_fields(&TransactionFormDefaults {
            kind,
            amount,
            date: date!(2025 - 03 - 15),
            description: None,
            autofocus_amount: false,
        });
        let markup = maud::html! { form { (fields) } };
        Html::parse_document(&markup.into_string())
    }

    #[track_caller]
    fn assert_checked_value(document: &Html, expected: &str) {
        let selector = Selector::parse("input[type=radio][name=kind]").unwrap();
        let inputs = document.select(&selector).collect::<Vec<_>>();
        assert_eq!(inputs.len(), 2, "want 2 kind inputs, got {}", inputs.len());

        let checked = inputs
            .iter()
            .find(|input| input.value().attr("checked").is_some())
            .and_then(|input| input.value().attr("value"));
        assert_eq!(
            checked,
            Some(expected),
            "want checked kind to be {expected}, got {checked:?}"
        );
    }
}
