//! Line item value type.

use common::LineItemId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::{Money, Rate};

/// One priced, discounted and taxed row on an invoice.
///
/// Only the inputs are stored. Every monetary figure is derived on demand,
/// each rounded to 2 places as soon as it is computed:
///
/// ```text
/// subtotal        = round2(quantity × unit_price)
/// discount_amount = round2(subtotal × discount_percent)
/// taxable_amount  = round2(subtotal − discount_amount)
/// tax_amount      = round2(taxable_amount × tax_rate)
/// total           = round2(taxable_amount + tax_amount)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    id: LineItemId,
    description: String,
    quantity: u32,
    unit_price: Money,
    discount_percent: Rate,
    tax_rate: Rate,
}

/// All derived amounts of a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemBreakdown {
    pub subtotal: Money,
    pub discount_amount: Money,
    pub taxable_amount: Money,
    pub tax_amount: Money,
    pub total: Money,
}

impl LineItem {
    /// Creates a validated line item with a freshly generated id.
    ///
    /// `unit_price` is normalised to 2 decimal places, `discount_percent` and
    /// `tax_rate` to 4.
    pub fn new(
        description: impl Into<String>,
        quantity: u32,
        unit_price: Decimal,
        discount_percent: Decimal,
        tax_rate: Decimal,
    ) -> Result<Self, ValidationError> {
        let description = description.into();

        if description.trim().is_empty() {
            return Err(ValidationError::new("description", "must not be blank"));
        }
        if quantity == 0 {
            return Err(ValidationError::new("quantity", "must be greater than 0"));
        }
        if unit_price < Decimal::ZERO {
            return Err(ValidationError::new(
                "unit_price",
                format!("must not be negative (got {unit_price})"),
            ));
        }
        if discount_percent < Decimal::ZERO || discount_percent > Decimal::ONE {
            return Err(ValidationError::new(
                "discount_percent",
                format!("must be between 0 and 1 (got {discount_percent})"),
            ));
        }
        if tax_rate < Decimal::ZERO {
            return Err(ValidationError::new(
                "tax_rate",
                format!("must not be negative (got {tax_rate})"),
            ));
        }

        let item = Self {
            id: LineItemId::new(),
            description,
            quantity,
            unit_price: Money::new(unit_price),
            discount_percent: Rate::new(discount_percent),
            tax_rate: Rate::new(tax_rate),
        };
        if item.checked_breakdown().is_none() {
            return Err(ValidationError::new("unit_price", "amount out of range"));
        }

        Ok(item)
    }

    /// Returns the same item under a different id.
    pub fn with_id(mut self, id: LineItemId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> LineItemId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn discount_percent(&self) -> Rate {
        self.discount_percent
    }

    pub fn tax_rate(&self) -> Rate {
        self.tax_rate
    }

    pub fn subtotal(&self) -> Money {
        self.unit_price.times(self.quantity)
    }

    pub fn discount_amount(&self) -> Money {
        self.subtotal().apply_rate(self.discount_percent)
    }

    pub fn taxable_amount(&self) -> Money {
        self.subtotal() - self.discount_amount()
    }

    pub fn tax_amount(&self) -> Money {
        self.taxable_amount().apply_rate(self.tax_rate)
    }

    pub fn total(&self) -> Money {
        self.taxable_amount() + self.tax_amount()
    }

    /// Computes every derived amount, or None if any of them overflows.
    ///
    /// Always `Some` for items built through [`LineItem::new`].
    pub fn checked_breakdown(&self) -> Option<LineItemBreakdown> {
        let subtotal = self.unit_price.checked_times(self.quantity)?;
        let discount_amount = subtotal.checked_apply_rate(self.discount_percent)?;
        let taxable_amount = subtotal.checked_sub(discount_amount)?;
        let tax_amount = taxable_amount.checked_apply_rate(self.tax_rate)?;
        Some(LineItemBreakdown {
            subtotal,
            discount_amount,
            taxable_amount,
            tax_amount,
            total: taxable_amount.checked_add(tax_amount)?,
        })
    }

    /// Computes every derived amount at once.
    pub fn breakdown(&self) -> LineItemBreakdown {
        let subtotal = self.subtotal();
        let discount_amount = subtotal.apply_rate(self.discount_percent);
        let taxable_amount = subtotal - discount_amount;
        let tax_amount = taxable_amount.apply_rate(self.tax_rate);
        LineItemBreakdown {
            subtotal,
            discount_amount,
            taxable_amount,
            tax_amount,
            total: taxable_amount + tax_amount,
        }
    }
}
