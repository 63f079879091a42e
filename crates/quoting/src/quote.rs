use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quotedesk_core::{Aggregate, AggregateRoot, DomainError, Event, LineItemId, Money};

use crate::customer::Customer;
use crate::discount;
use crate::number::QuoteNumber;
use crate::snapshot::QuoteSnapshot;
use crate::totals::{QuoteTotals, TaxSelection};

/// Footer shown on every new quote until the operator edits it.
pub const DEFAULT_FOOTER_NOTES: &str = "Pricing subject to change. Please review all details carefully.\n\
International customers will be responsible for all duties and taxes upon delivery.";

/// A single line on a quote.
///
/// `sku` is empty for custom (off-catalog) lines. Zero-quantity lines are
/// legal while editing; they price at $0 and are skipped in documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub sku: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub notes: String,
}

impl LineItem {
    pub fn total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// Extra charges on top of the line items.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fees {
    pub drop_ship_fee: Money,
    pub freight: Money,
}

/// Aggregate root: Quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    number: QuoteNumber,
    customer: Customer,
    lines: Vec<LineItem>,
    fees: Fees,
    tax: TaxSelection,
    freight_notes: String,
    footer_notes: String,
    version: u64,
    opened: bool,
}

impl Quote {
    /// Create an empty, not-yet-opened aggregate instance for rehydration.
    pub fn empty(number: QuoteNumber) -> Self {
        Self {
            number,
            customer: Customer::default(),
            lines: Vec::new(),
            fees: Fees::default(),
            tax: TaxSelection::default(),
            freight_notes: String::new(),
            footer_notes: DEFAULT_FOOTER_NOTES.to_string(),
            version: 0,
            opened: false,
        }
    }

    /// Rebuild a quote from a stored event log.
    pub fn replay(number: QuoteNumber, events: &[QuoteEvent]) -> Self {
        let mut quote = Self::empty(number);
        for event in events {
            quote.apply(event);
        }
        quote
    }

    pub fn number(&self) -> &QuoteNumber {
        &self.number
    }

    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    /// The operator-entered lines, without the derived discount.
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn line(&self, id: LineItemId) -> Option<&LineItem> {
        self.lines.iter().find(|l| l.id == id)
    }

    pub fn fees(&self) -> Fees {
        self.fees
    }

    pub fn tax(&self) -> TaxSelection {
        self.tax
    }

    pub fn freight_notes(&self) -> &str {
        &self.freight_notes
    }

    pub fn footer_notes(&self) -> &str {
        &self.footer_notes
    }

    pub fn is_opened(&self) -> bool {
        self.opened
    }

    /// All lines including the derived course-discount line, in display order.
    pub fn lines_with_discount(&self) -> Vec<LineItem> {
        let mut lines = self.lines.clone();
        if let Some(discount) = discount::derived_discount_line(&self.lines) {
            lines.push(discount);
        }
        lines
    }

    /// Derived money summary for the current state.
    pub fn totals(&self) -> QuoteTotals {
        let subtotal: Money = self.lines_with_discount().iter().map(LineItem::total).sum();
        QuoteTotals::compute(
            subtotal,
            self.fees.drop_ship_fee,
            self.fees.freight,
            self.tax.rate(),
        )
    }

    /// Snapshot of the full state plus derived views, dated `date`.
    pub fn snapshot(&self, date: DateTime<Utc>) -> QuoteSnapshot {
        QuoteSnapshot {
            quote_no: self.number.clone(),
            date,
            customer: self.customer.clone(),
            line_items: self.lines_with_discount(),
            fees: self.fees,
            tax: self.tax,
            totals: self.totals(),
            freight_notes: self.freight_notes.clone(),
            footer_notes: self.footer_notes.clone(),
        }
    }
}

impl AggregateRoot for Quote {
    type Id = QuoteNumber;

    fn id(&self) -> &Self::Id {
        &self.number
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: OpenQuote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenQuote {
    pub number: QuoteNumber,
    /// Initial tax selection (the configured default rate).
    pub tax: TaxSelection,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetCustomer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetCustomer {
    pub number: QuoteNumber,
    pub customer: Customer,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddLineItem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddLineItem {
    pub number: QuoteNumber,
    pub line_id: LineItemId,
    pub sku: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub notes: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateLineItem (partial update of an existing line).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateLineItem {
    pub number: QuoteNumber,
    pub line_id: LineItemId,
    pub quantity: Option<u32>,
    pub unit_price: Option<Money>,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveLineItem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveLineItem {
    pub number: QuoteNumber,
    pub line_id: LineItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetFees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetFees {
    pub number: QuoteNumber,
    pub fees: Fees,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SelectTax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectTax {
    pub number: QuoteNumber,
    pub tax: TaxSelection,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetFreightNotes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetFreightNotes {
    pub number: QuoteNumber,
    pub notes: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetFooterNotes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetFooterNotes {
    pub number: QuoteNumber,
    pub notes: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QuoteCommand {
    OpenQuote(OpenQuote),
    SetCustomer(SetCustomer),
    AddLineItem(AddLineItem),
    UpdateLineItem(UpdateLineItem),
    RemoveLineItem(RemoveLineItem),
    SetFees(SetFees),
    SelectTax(SelectTax),
    SetFreightNotes(SetFreightNotes),
    SetFooterNotes(SetFooterNotes),
}

/// Event: QuoteOpened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteOpened {
    pub number: QuoteNumber,
    pub tax: TaxSelection,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CustomerSet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSet {
    pub number: QuoteNumber,
    pub customer: Customer,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineItemAdded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemAdded {
    pub number: QuoteNumber,
    pub line: LineItem,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineItemUpdated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemUpdated {
    pub number: QuoteNumber,
    pub line_id: LineItemId,
    pub quantity: Option<u32>,
    pub unit_price: Option<Money>,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineItemRemoved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemRemoved {
    pub number: QuoteNumber,
    pub line_id: LineItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: FeesSet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeesSet {
    pub number: QuoteNumber,
    pub fees: Fees,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TaxSelected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxSelected {
    pub number: QuoteNumber,
    pub tax: TaxSelection,
    pub occurred_at: DateTime<Utc>,
}

/// Event: FreightNotesSet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreightNotesSet {
    pub number: QuoteNumber,
    pub notes: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: FooterNotesSet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FooterNotesSet {
    pub number: QuoteNumber,
    pub notes: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QuoteEvent {
    QuoteOpened(QuoteOpened),
    CustomerSet(CustomerSet),
    LineItemAdded(LineItemAdded),
    LineItemUpdated(LineItemUpdated),
    LineItemRemoved(LineItemRemoved),
    FeesSet(FeesSet),
    TaxSelected(TaxSelected),
    FreightNotesSet(FreightNotesSet),
    FooterNotesSet(FooterNotesSet),
}

impl Event for QuoteEvent {
    fn event_type(&self) -> &'static str {
        match self {
            QuoteEvent::QuoteOpened(_) => "quoting.quote.opened",
            QuoteEvent::CustomerSet(_) => "quoting.quote.customer_set",
            QuoteEvent::LineItemAdded(_) => "quoting.quote.line_added",
            QuoteEvent::LineItemUpdated(_) => "quoting.quote.line_updated",
            QuoteEvent::LineItemRemoved(_) => "quoting.quote.line_removed",
            QuoteEvent::FeesSet(_) => "quoting.quote.fees_set",
            QuoteEvent::TaxSelected(_) => "quoting.quote.tax_selected",
            QuoteEvent::FreightNotesSet(_) => "quoting.quote.freight_notes_set",
            QuoteEvent::FooterNotesSet(_) => "quoting.quote.footer_notes_set",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            QuoteEvent::QuoteOpened(e) => e.occurred_at,
            QuoteEvent::CustomerSet(e) => e.occurred_at,
            QuoteEvent::LineItemAdded(e) => e.occurred_at,
            QuoteEvent::LineItemUpdated(e) => e.occurred_at,
            QuoteEvent::LineItemRemoved(e) => e.occurred_at,
            QuoteEvent::FeesSet(e) => e.occurred_at,
            QuoteEvent::TaxSelected(e) => e.occurred_at,
            QuoteEvent::FreightNotesSet(e) => e.occurred_at,
            QuoteEvent::FooterNotesSet(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Quote {
    type Command = QuoteCommand;
    type Event = QuoteEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            QuoteEvent::QuoteOpened(e) => {
                self.number = e.number.clone();
                self.tax = e.tax;
                self.opened = true;
            }
            QuoteEvent::CustomerSet(e) => {
                self.customer = e.customer.clone();
            }
            QuoteEvent::LineItemAdded(e) => {
                self.lines.push(e.line.clone());
            }
            QuoteEvent::LineItemUpdated(e) => {
                if let Some(line) = self.lines.iter_mut().find(|l| l.id == e.line_id) {
                    if let Some(quantity) = e.quantity {
                        line.quantity = quantity;
                    }
                    if let Some(unit_price) = e.unit_price {
                        line.unit_price = unit_price;
                    }
                    if let Some(notes) = &e.notes {
                        line.notes = notes.clone();
                    }
                }
            }
            QuoteEvent::LineItemRemoved(e) => {
                self.lines.retain(|l| l.id != e.line_id);
            }
            QuoteEvent::FeesSet(e) => {
                self.fees = e.fees;
            }
            QuoteEvent::TaxSelected(e) => {
                self.tax = e.tax;
            }
            QuoteEvent::FreightNotesSet(e) => {
                self.freight_notes = e.notes.clone();
            }
            QuoteEvent::FooterNotesSet(e) => {
                self.footer_notes = e.notes.clone();
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            QuoteCommand::OpenQuote(cmd) => self.handle_open(cmd),
            QuoteCommand::SetCustomer(cmd) => self.handle_set_customer(cmd),
            QuoteCommand::AddLineItem(cmd) => self.handle_add_line(cmd),
            QuoteCommand::UpdateLineItem(cmd) => self.handle_update_line(cmd),
            QuoteCommand::RemoveLineItem(cmd) => self.handle_remove_line(cmd),
            QuoteCommand::SetFees(cmd) => self.handle_set_fees(cmd),
            QuoteCommand::SelectTax(cmd) => self.handle_select_tax(cmd),
            QuoteCommand::SetFreightNotes(cmd) => self.handle_set_freight_notes(cmd),
            QuoteCommand::SetFooterNotes(cmd) => self.handle_set_footer_notes(cmd),
        }
    }
}

impl Quote {
    fn ensure_opened(&self) -> Result<(), DomainError> {
        if !self.opened {
            return Err(DomainError::not_found());
        }
        Ok(())
    }

    fn ensure_number(&self, number: &QuoteNumber) -> Result<(), DomainError> {
        if &self.number != number {
            return Err(DomainError::invariant("quote number mismatch"));
        }
        Ok(())
    }

    fn handle_open(&self, cmd: &OpenQuote) -> Result<Vec<QuoteEvent>, DomainError> {
        if self.opened {
            return Err(DomainError::conflict("quote already opened"));
        }

        Ok(vec![QuoteEvent::QuoteOpened(QuoteOpened {
            number: cmd.number.clone(),
            tax: cmd.tax,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_customer(&self, cmd: &SetCustomer) -> Result<Vec<QuoteEvent>, DomainError> {
        self.ensure_opened()?;
        self.ensure_number(&cmd.number)?;

        Ok(vec![QuoteEvent::CustomerSet(CustomerSet {
            number: cmd.number.clone(),
            customer: cmd.customer.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_line(&self, cmd: &AddLineItem) -> Result<Vec<QuoteEvent>, DomainError> {
        self.ensure_opened()?;
        self.ensure_number(&cmd.number)?;

        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("line item name cannot be empty"));
        }

        if discount::is_reserved(&cmd.sku, &cmd.name) {
            return Err(DomainError::validation(
                "the course discount line is applied automatically and cannot be added manually",
            ));
        }

        if self.line(cmd.line_id).is_some() {
            return Err(DomainError::conflict("line item id already present"));
        }

        Ok(vec![QuoteEvent::LineItemAdded(LineItemAdded {
            number: cmd.number.clone(),
            line: LineItem {
                id: cmd.line_id,
                sku: cmd.sku.trim().to_string(),
                name: cmd.name.trim().to_string(),
                quantity: cmd.quantity,
                unit_price: cmd.unit_price,
                notes: cmd.notes.clone(),
            },
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_line(&self, cmd: &UpdateLineItem) -> Result<Vec<QuoteEvent>, DomainError> {
        self.ensure_opened()?;
        self.ensure_number(&cmd.number)?;

        if self.line(cmd.line_id).is_none() {
            return Err(DomainError::not_found());
        }

        Ok(vec![QuoteEvent::LineItemUpdated(LineItemUpdated {
            number: cmd.number.clone(),
            line_id: cmd.line_id,
            quantity: cmd.quantity,
            unit_price: cmd.unit_price,
            notes: cmd.notes.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove_line(&self, cmd: &RemoveLineItem) -> Result<Vec<QuoteEvent>, DomainError> {
        self.ensure_opened()?;
        self.ensure_number(&cmd.number)?;

        if self.line(cmd.line_id).is_none() {
            return Err(DomainError::not_found());
        }

        Ok(vec![QuoteEvent::LineItemRemoved(LineItemRemoved {
            number: cmd.number.clone(),
            line_id: cmd.line_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_fees(&self, cmd: &SetFees) -> Result<Vec<QuoteEvent>, DomainError> {
        self.ensure_opened()?;
        self.ensure_number(&cmd.number)?;

        if cmd.fees.drop_ship_fee.is_negative() || cmd.fees.freight.is_negative() {
            return Err(DomainError::validation("fees cannot be negative"));
        }

        Ok(vec![QuoteEvent::FeesSet(FeesSet {
            number: cmd.number.clone(),
            fees: cmd.fees,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_select_tax(&self, cmd: &SelectTax) -> Result<Vec<QuoteEvent>, DomainError> {
        self.ensure_opened()?;
        self.ensure_number(&cmd.number)?;

        Ok(vec![QuoteEvent::TaxSelected(TaxSelected {
            number: cmd.number.clone(),
            tax: cmd.tax,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_freight_notes(&self, cmd: &SetFreightNotes) -> Result<Vec<QuoteEvent>, DomainError> {
        self.ensure_opened()?;
        self.ensure_number(&cmd.number)?;

        Ok(vec![QuoteEvent::FreightNotesSet(FreightNotesSet {
            number: cmd.number.clone(),
            notes: cmd.notes.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_footer_notes(&self, cmd: &SetFooterNotes) -> Result<Vec<QuoteEvent>, DomainError> {
        self.ensure_opened()?;
        self.ensure_number(&cmd.number)?;

        Ok(vec![QuoteEvent::FooterNotesSet(FooterNotesSet {
            number: cmd.number.clone(),
            notes: cmd.notes.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_number() -> QuoteNumber {
        "20251002-1359".parse().unwrap()
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn opened_quote() -> Quote {
        let mut quote = Quote::empty(test_number());
        let events = quote
            .handle(&QuoteCommand::OpenQuote(OpenQuote {
                number: test_number(),
                tax: TaxSelection::default(),
                occurred_at: test_time(),
            }))
            .unwrap();
        quote.apply(&events[0]);
        quote
    }

    fn add_line(quote: &mut Quote, sku: &str, name: &str, quantity: u32, cents: i64) -> LineItemId {
        let line_id = LineItemId::new();
        let events = quote
            .handle(&QuoteCommand::AddLineItem(AddLineItem {
                number: quote.number().clone(),
                line_id,
                sku: sku.to_string(),
                name: name.to_string(),
                quantity,
                unit_price: Money::from_cents(cents),
                notes: String::new(),
                occurred_at: test_time(),
            }))
            .unwrap();
        quote.apply(&events[0]);
        line_id
    }

    #[test]
    fn open_quote_emits_quote_opened_event() {
        let quote = Quote::empty(test_number());
        let events = quote
            .handle(&QuoteCommand::OpenQuote(OpenQuote {
                number: test_number(),
                tax: TaxSelection::SantaCruzCounty,
                occurred_at: test_time(),
            }))
            .unwrap();
        assert_eq!(events.len(), 1);

        match &events[0] {
            QuoteEvent::QuoteOpened(e) => {
                assert_eq!(e.number, test_number());
                assert_eq!(e.tax, TaxSelection::SantaCruzCounty);
            }
            _ => panic!("Expected QuoteOpened event"),
        }
    }

    #[test]
    fn open_quote_rejects_duplicate_open() {
        let quote = opened_quote();
        let err = quote
            .handle(&QuoteCommand::OpenQuote(OpenQuote {
                number: test_number(),
                tax: TaxSelection::default(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            DomainError::Conflict(_) => {}
            _ => panic!("Expected Conflict error for duplicate open"),
        }
    }

    #[test]
    fn commands_against_unopened_quote_are_not_found() {
        let quote = Quote::empty(test_number());
        let err = quote
            .handle(&QuoteCommand::SetFreightNotes(SetFreightNotes {
                number: test_number(),
                notes: "2 pallets".to_string(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn commands_with_wrong_number_violate_invariant() {
        let quote = opened_quote();
        let other: QuoteNumber = "20240101-0900".parse().unwrap();
        let err = quote
            .handle(&QuoteCommand::SetFees(SetFees {
                number: other,
                fees: Fees::default(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) if msg.contains("quote number mismatch") => {}
            _ => panic!("Expected InvariantViolation for number mismatch"),
        }
    }

    #[test]
    fn add_line_trims_and_stores_the_line() {
        let mut quote = opened_quote();
        add_line(&mut quote, " M5-ST ", " Mach 5 Standard Basket ", 2, 49_900);

        assert_eq!(quote.lines().len(), 1);
        let line = &quote.lines()[0];
        assert_eq!(line.sku, "M5-ST");
        assert_eq!(line.name, "Mach 5 Standard Basket");
        assert_eq!(line.total(), Money::from_cents(99_800));
    }

    #[test]
    fn add_line_rejects_empty_name() {
        let quote = opened_quote();
        let err = quote
            .handle(&QuoteCommand::AddLineItem(AddLineItem {
                number: test_number(),
                line_id: LineItemId::new(),
                sku: String::new(),
                name: "   ".to_string(),
                quantity: 1,
                unit_price: Money::ZERO,
                notes: String::new(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for empty name"),
        }
    }

    #[test]
    fn add_line_rejects_reserved_discount_line() {
        let quote = opened_quote();
        for (sku, name) in [("CD", "anything"), ("", "Course Discount")] {
            let err = quote
                .handle(&QuoteCommand::AddLineItem(AddLineItem {
                    number: test_number(),
                    line_id: LineItemId::new(),
                    sku: sku.to_string(),
                    name: name.to_string(),
                    quantity: 1,
                    unit_price: Money::ZERO,
                    notes: String::new(),
                    occurred_at: test_time(),
                }))
                .unwrap_err();
            match err {
                DomainError::Validation(_) => {}
                _ => panic!("Expected Validation error for reserved line {sku}/{name}"),
            }
        }
    }

    #[test]
    fn add_line_rejects_duplicate_line_id() {
        let mut quote = opened_quote();
        let line_id = add_line(&mut quote, "M5-ST", "Mach 5 Standard Basket", 1, 49_900);

        let err = quote
            .handle(&QuoteCommand::AddLineItem(AddLineItem {
                number: test_number(),
                line_id,
                sku: "M7-PT".to_string(),
                name: "Mach 7 Portable Basket".to_string(),
                quantity: 1,
                unit_price: Money::from_cents(39_900),
                notes: String::new(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            DomainError::Conflict(_) => {}
            _ => panic!("Expected Conflict error for duplicate line id"),
        }
    }

    #[test]
    fn update_line_applies_partial_changes() {
        let mut quote = opened_quote();
        let line_id = add_line(&mut quote, "M5-ST", "Mach 5 Standard Basket", 1, 49_900);

        let events = quote
            .handle(&QuoteCommand::UpdateLineItem(UpdateLineItem {
                number: test_number(),
                line_id,
                quantity: Some(3),
                unit_price: None,
                notes: Some("powder coat: red".to_string()),
                occurred_at: test_time(),
            }))
            .unwrap();
        quote.apply(&events[0]);

        let line = quote.line(line_id).unwrap();
        assert_eq!(line.quantity, 3);
        assert_eq!(line.unit_price, Money::from_cents(49_900));
        assert_eq!(line.notes, "powder coat: red");
    }

    #[test]
    fn update_and_remove_reject_unknown_lines() {
        let quote = opened_quote();
        let missing = LineItemId::new();

        let err = quote
            .handle(&QuoteCommand::UpdateLineItem(UpdateLineItem {
                number: test_number(),
                line_id: missing,
                quantity: Some(1),
                unit_price: None,
                notes: None,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound);

        let err = quote
            .handle(&QuoteCommand::RemoveLineItem(RemoveLineItem {
                number: test_number(),
                line_id: missing,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn remove_line_deletes_the_line() {
        let mut quote = opened_quote();
        let line_id = add_line(&mut quote, "M5-ST", "Mach 5 Standard Basket", 1, 49_900);

        let events = quote
            .handle(&QuoteCommand::RemoveLineItem(RemoveLineItem {
                number: test_number(),
                line_id,
                occurred_at: test_time(),
            }))
            .unwrap();
        quote.apply(&events[0]);
        assert!(quote.lines().is_empty());
    }

    #[test]
    fn set_fees_rejects_negative_amounts() {
        let quote = opened_quote();
        let err = quote
            .handle(&QuoteCommand::SetFees(SetFees {
                number: test_number(),
                fees: Fees {
                    drop_ship_fee: Money::from_cents(-1),
                    freight: Money::ZERO,
                },
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for negative fees"),
        }
    }

    #[test]
    fn discount_line_is_derived_not_stored() {
        let mut quote = opened_quote();
        add_line(&mut quote, "M5-ST", "Mach 5 Standard Basket", 9, 49_900);

        assert_eq!(quote.lines().len(), 1);
        let all = quote.lines_with_discount();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].sku, crate::discount::COURSE_DISCOUNT_SKU);
        assert_eq!(all[1].total(), Money::from_cents(-90_000));

        // Dropping below the threshold makes the derived line vanish.
        let line_id = quote.lines()[0].id;
        let events = quote
            .handle(&QuoteCommand::UpdateLineItem(UpdateLineItem {
                number: test_number(),
                line_id,
                quantity: Some(8),
                unit_price: None,
                notes: None,
                occurred_at: test_time(),
            }))
            .unwrap();
        quote.apply(&events[0]);
        assert_eq!(quote.lines_with_discount().len(), 1);
    }

    #[test]
    fn totals_include_discount_fees_and_tax() {
        let mut quote = opened_quote();
        add_line(&mut quote, "M5-ST", "Mach 5 Standard Basket", 9, 49_900);

        let events = quote
            .handle(&QuoteCommand::SetFees(SetFees {
                number: test_number(),
                fees: Fees {
                    drop_ship_fee: Money::from_cents(2_500),
                    freight: Money::from_cents(35_000),
                },
                occurred_at: test_time(),
            }))
            .unwrap();
        quote.apply(&events[0]);

        let events = quote
            .handle(&QuoteCommand::SelectTax(SelectTax {
                number: test_number(),
                tax: TaxSelection::SantaCruzCounty,
                occurred_at: test_time(),
            }))
            .unwrap();
        quote.apply(&events[0]);

        let totals = quote.totals();
        // 9 x $499 - 9 x $100 = $3,591.00
        assert_eq!(totals.subtotal, Money::from_cents(359_100));
        // pre-tax = $3,591.00 + $25.00 + $350.00 = $3,966.00
        // tax = $3,966.00 * 9.75% = $386.685 -> $386.69 (half away from zero)
        assert_eq!(totals.sales_tax, Money::from_cents(38_669));
        assert_eq!(totals.grand_total, Money::from_cents(435_269));
    }

    #[test]
    fn snapshot_carries_derived_views() {
        let mut quote = opened_quote();
        add_line(&mut quote, "M5-ST", "Mach 5 Standard Basket", 9, 49_900);

        let date = test_time();
        let snapshot = quote.snapshot(date);
        assert_eq!(snapshot.quote_no, test_number());
        assert_eq!(snapshot.date, date);
        assert_eq!(snapshot.line_items.len(), 2);
        assert_eq!(snapshot.totals, quote.totals());
        assert_eq!(snapshot.footer_notes, DEFAULT_FOOTER_NOTES);
    }

    #[test]
    fn version_increments_on_apply() {
        let mut quote = Quote::empty(test_number());
        assert_eq!(quote.version(), 0);

        let events = quote
            .handle(&QuoteCommand::OpenQuote(OpenQuote {
                number: test_number(),
                tax: TaxSelection::default(),
                occurred_at: test_time(),
            }))
            .unwrap();
        quote.apply(&events[0]);
        assert_eq!(quote.version(), 1);

        add_line(&mut quote, "M5-ST", "Mach 5 Standard Basket", 1, 49_900);
        assert_eq!(quote.version(), 2);
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let mut quote = opened_quote();
        add_line(&mut quote, "M5-ST", "Mach 5 Standard Basket", 1, 49_900);
        let before = quote.clone();

        let cmd = QuoteCommand::SetFreightNotes(SetFreightNotes {
            number: test_number(),
            notes: "XPO, residential w/ liftgate".to_string(),
            occurred_at: test_time(),
        });

        let events1 = quote.handle(&cmd).unwrap();
        let events2 = quote.handle(&cmd).unwrap();

        assert_eq!(quote, before);
        assert_eq!(events1, events2);
    }

    #[test]
    fn replay_reproduces_state() {
        let mut quote = opened_quote();
        add_line(&mut quote, "M5-ST", "Mach 5 Standard Basket", 9, 49_900);
        add_line(&mut quote, "TS-BASIC", "Basic Color Tee Sign", 18, 5_500);

        let events = vec![
            QuoteEvent::QuoteOpened(QuoteOpened {
                number: test_number(),
                tax: TaxSelection::default(),
                occurred_at: test_time(),
            }),
            QuoteEvent::LineItemAdded(LineItemAdded {
                number: test_number(),
                line: quote.lines()[0].clone(),
                occurred_at: test_time(),
            }),
            QuoteEvent::LineItemAdded(LineItemAdded {
                number: test_number(),
                line: quote.lines()[1].clone(),
                occurred_at: test_time(),
            }),
        ];

        let replayed = Quote::replay(test_number(), &events);
        assert_eq!(replayed.lines(), quote.lines());
        assert_eq!(replayed.totals(), quote.totals());
        assert_eq!(replayed.version(), 3);
    }

    #[test]
    fn events_round_trip_through_json() {
        let event = QuoteEvent::LineItemAdded(LineItemAdded {
            number: test_number(),
            line: LineItem {
                id: LineItemId::new(),
                sku: "M5-ST".to_string(),
                name: "Mach 5 Standard Basket".to_string(),
                quantity: 2,
                unit_price: Money::from_cents(49_900),
                notes: String::new(),
            },
            occurred_at: test_time(),
        });

        let json = serde_json::to_string(&event).unwrap();
        let back: QuoteEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: handle is deterministic and never mutates state.
            #[test]
            fn handle_is_deterministic(
                sku in "[A-Z0-9-]{1,10}",
                name in "[A-Za-z][A-Za-z0-9 ]{0,40}",
                quantity in 0u32..50,
                cents in -100_000i64..100_000,
            ) {
                prop_assume!(!crate::discount::is_reserved(&sku, &name));

                let quote = opened_quote();
                let cmd = QuoteCommand::AddLineItem(AddLineItem {
                    number: test_number(),
                    line_id: LineItemId::new(),
                    sku,
                    name,
                    quantity,
                    unit_price: Money::from_cents(cents),
                    notes: String::new(),
                    occurred_at: test_time(),
                });

                let before = quote.clone();
                let events1 = quote.handle(&cmd);
                let events2 = quote.handle(&cmd);

                prop_assert_eq!(&quote, &before);
                prop_assert_eq!(events1, events2);
            }

            /// Property: replaying the emitted events reproduces the state.
            #[test]
            fn replay_matches_incremental_application(
                quantities in proptest::collection::vec(0u32..20, 1..6),
            ) {
                let mut quote = opened_quote();
                let mut log = vec![QuoteEvent::QuoteOpened(QuoteOpened {
                    number: test_number(),
                    tax: TaxSelection::default(),
                    occurred_at: test_time(),
                })];

                for quantity in quantities {
                    let cmd = QuoteCommand::AddLineItem(AddLineItem {
                        number: test_number(),
                        line_id: LineItemId::new(),
                        sku: "M5-ST".to_string(),
                        name: "Mach 5 Standard Basket".to_string(),
                        quantity,
                        unit_price: Money::from_cents(49_900),
                        notes: String::new(),
                        occurred_at: test_time(),
                    });
                    let events = quote.handle(&cmd).unwrap();
                    for event in &events {
                        quote.apply(event);
                    }
                    log.extend(events);
                }

                let replayed = Quote::replay(test_number(), &log);
                prop_assert_eq!(replayed, quote);
            }
        }
    }
}
