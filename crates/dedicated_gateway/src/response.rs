// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use gateway_store::{Item, RequestCharge};

use crate::{ChargeRecord, ServedFrom};

/// The items returned by a dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Output {
    /// A single item, from a write or a point read.
    Item(Item),
    /// Query or batched read results.
    Items(Vec<Item>),
}

impl Output {
    /// Returns the single item, if this output holds one.
    #[must_use]
    pub fn as_item(&self) -> Option<&Item> {
        match self {
            Self::Item(item) => Some(item),
            Self::Items(_) => None,
        }
    }

    /// Returns all items as a slice.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        match self {
            Self::Item(item) => std::slice::from_ref(item),
            Self::Items(items) => items,
        }
    }

    /// Converts the output into a list of items.
    #[must_use]
    pub fn into_items(self) -> Vec<Item> {
        match self {
            Self::Item(item) => vec![item],
            Self::Items(items) => items,
        }
    }
}

/// The result of a successful dispatch.
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    output: Output,
    charge: ChargeRecord,
    sources: Vec<ServedFrom>,
    page_charges: Vec<RequestCharge>,
}

impl Response {
    pub(crate) fn new(output: Output, charge: ChargeRecord, sources: Vec<ServedFrom>) -> Self {
        Self {
            output,
            charge,
            sources,
            page_charges: Vec::new(),
        }
    }

    pub(crate) fn with_page_charges(self, page_charges: Vec<RequestCharge>) -> Self {
        Self { page_charges, ..self }
    }

    /// Returns the returned items.
    #[must_use]
    pub fn output(&self) -> &Output {
        &self.output
    }

    /// Returns the single returned item, if any.
    #[must_use]
    pub fn item(&self) -> Option<&Item> {
        self.output.as_item()
    }

    /// Returns all returned items.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        self.output.items()
    }

    /// Returns the charge record of this dispatch.
    #[must_use]
    pub fn charge(&self) -> ChargeRecord {
        self.charge
    }

    /// Returns the charged units.
    #[must_use]
    pub fn request_charge(&self) -> RequestCharge {
        self.charge.units()
    }

    /// Returns where the dispatch as a whole was served from.
    #[must_use]
    pub fn served_from(&self) -> ServedFrom {
        self.charge.served_from()
    }

    /// Returns where each returned item came from, in output order.
    #[must_use]
    pub fn sources(&self) -> &[ServedFrom] {
        &self.sources
    }

    /// Returns the charge of every store page a query consumed.
    ///
    /// Empty unless the dispatch was a query served from the store.
    #[must_use]
    pub fn page_charges(&self) -> &[RequestCharge] {
        &self.page_charges
    }

    /// Consumes the response, returning its output.
    #[must_use]
    pub fn into_output(self) -> Output {
        self.output
    }
}
