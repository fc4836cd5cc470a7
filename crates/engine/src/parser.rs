//! Labeled-field extraction from free-text sale notifications.
//!
//! Each field has its own extractor returning an `Option`; none depends on
//! another succeeding, so a message with a garbled value field still yields
//! its timestamp and duration. Labels are accepted in English and Portuguese
//! (`Client ID` / `ID do cliente`, `Plan` / `Plano`, `Conversion time` /
//! `Tempo de conversão`, `Purchase date/time` / `Data/hora da compra`).

use attribution_core::types::{ConversionDuration, SaleRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

static CLIENT_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:client\s*id|id\s+do\s+cliente)[^\d\n]*(\d+)").expect("client id pattern")
});

static PLAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bplano?\b[\s:\-]*(\w+)").expect("plan pattern"));

static VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:R\$|US\$|\$)\s*(\d[\d.,]*)").expect("value pattern"));

static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:conversion\s*time|tempo\s+de\s+convers[aã]o)[^\d\n]*?(\d+)\s*d[^\d\n]*?(\d+)\s*h[^\d\n]*?(\d+)\s*m[^\d\n]*?(\d+)\s*s",
    )
    .expect("duration pattern")
});

static PURCHASE_DATE_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:purchase\s*date(?:\s*/\s*time)?|data(?:\s*/\s*hora)?\s+da\s+compra)\D*?(\d{2}/\d{2}/\d{4})\D*?(\d{2}:\d{2})",
    )
    .expect("purchase date/time pattern")
});

/// Extracts a [`SaleRecord`] from notification text. Never fails: fields
/// that cannot be found are left as `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageParser;

impl MessageParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, text: &str) -> SaleRecord {
        let record = SaleRecord {
            client_id: extract_client_id(text),
            plan: extract_plan(text),
            value: extract_value(text),
            purchase_date_time: extract_purchase_date_time(text),
            conversion_duration: extract_conversion_duration(text),
            raw_text: text.to_string(),
        };

        debug!(
            client_id = ?record.client_id,
            plan = ?record.plan,
            has_value = record.value.is_some(),
            has_purchase_time = record.purchase_date_time.is_some(),
            has_duration = record.conversion_duration.is_some(),
            "Parsed sale notification"
        );

        record
    }
}

/// First run of digits after the client-ID label.
pub fn extract_client_id(text: &str) -> Option<String> {
    CLIENT_ID
        .captures(text)
        .map(|caps| caps[1].to_string())
}

/// Word token right after the plan label.
pub fn extract_plan(text: &str) -> Option<String> {
    PLAN.captures(text).map(|caps| caps[1].to_string())
}

/// Currency-prefixed amount. A comma decimal separator is normalized to a dot;
/// when both separators appear the dots are thousands separators.
pub fn extract_value(text: &str) -> Option<Decimal> {
    let caps = VALUE.captures(text)?;
    let amount = caps[1].trim_end_matches(['.', ',']);
    let normalized = if amount.contains(',') {
        amount.replace('.', "").replace(',', ".")
    } else {
        amount.to_string()
    };
    Decimal::from_str(&normalized).ok()
}

/// Days, hours, minutes and seconds after the conversion-time label. All four
/// must be present on the label's line.
pub fn extract_conversion_duration(text: &str) -> Option<ConversionDuration> {
    let caps = DURATION.captures(text)?;
    let component = |i: usize| caps[i].parse::<u32>().ok();
    Some(ConversionDuration::new(
        component(1)?,
        component(2)?,
        component(3)?,
        component(4)?,
    ))
}

/// `DD/MM/YYYY HH:MM` token after the purchase date/time label.
pub fn extract_purchase_date_time(text: &str) -> Option<String> {
    PURCHASE_DATE_TIME
        .captures(text)
        .map(|caps| format!("{} {}", &caps[1], &caps[2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_MESSAGE: &str = "Nova venda aprovada!\n\
        Client ID: 482913\n\
        Plan Premium (anual)\n\
        Valor: R$ 197,90\n\
        Conversion time: 0d 2h 15m 30s\n\
        Purchase date/time: 01/03/2024 00:10";

    #[test]
    fn test_parse_full_message() {
        let record = MessageParser::new().parse(FULL_MESSAGE);
        assert_eq!(record.client_id.as_deref(), Some("482913"));
        assert_eq!(record.plan.as_deref(), Some("Premium"));
        assert_eq!(record.value, Some(Decimal::new(19790, 2)));
        assert_eq!(
            record.conversion_duration,
            Some(ConversionDuration::new(0, 2, 15, 30))
        );
        assert_eq!(record.purchase_date_time.as_deref(), Some("01/03/2024 00:10"));
        assert_eq!(record.raw_text, FULL_MESSAGE);
    }

    #[test]
    fn test_parse_portuguese_labels() {
        let text = "ID do cliente: 77\n\
            Plano: Basico\n\
            Tempo de conversão: 1 dias, 3 horas, 0 minutos e 12 segundos\n\
            Data/hora da compra: 15/07/2024 às 18:45";
        let record = MessageParser::new().parse(text);
        assert_eq!(record.client_id.as_deref(), Some("77"));
        assert_eq!(record.plan.as_deref(), Some("Basico"));
        assert_eq!(
            record.conversion_duration,
            Some(ConversionDuration::new(1, 3, 0, 12))
        );
        assert_eq!(record.purchase_date_time.as_deref(), Some("15/07/2024 18:45"));
        assert!(record.value.is_none());
    }

    #[test]
    fn test_value_comma_decimal() {
        assert_eq!(extract_value("R$ 10,50"), Some(Decimal::new(1050, 2)));
        assert_eq!(
            extract_value("R$ 10,50").map(|d| d.to_string()),
            Some("10.50".to_string())
        );
    }

    #[test]
    fn test_value_integer() {
        assert_eq!(extract_value("R$ 1000"), Some(Decimal::new(1000, 0)));
    }

    #[test]
    fn test_value_thousands_and_trailing_punctuation() {
        assert_eq!(extract_value("Total R$ 1.234,56."), Some(Decimal::new(123456, 2)));
        assert_eq!(extract_value("paid $ 49.90"), Some(Decimal::new(4990, 2)));
    }

    #[test]
    fn test_value_requires_currency_prefix() {
        assert_eq!(extract_value("amount 10,50"), None);
    }

    #[test]
    fn test_partial_duration_is_absent() {
        assert_eq!(extract_conversion_duration("Conversion time: 1d 2h"), None);
        assert_eq!(
            extract_conversion_duration("Conversion time: 1d 2h 3m\nPurchase date/time: 01/03/2024 00:10"),
            None
        );
    }

    #[test]
    fn test_duration_does_not_borrow_digits_from_later_lines() {
        assert_eq!(
            extract_conversion_duration("Conversion time: 1d 2h 3m\nPlan Pro 5 seats"),
            None
        );
        assert_eq!(
            extract_conversion_duration("Tempo de conversão: 1d 2h\n3m 4s"),
            None
        );
        assert_eq!(
            extract_conversion_duration("Conversion time: 1d 2h 3m 4s\nPlan Pro 5 seats"),
            Some(ConversionDuration::new(1, 2, 3, 4))
        );
    }

    #[test]
    fn test_plan_is_case_insensitive() {
        assert_eq!(extract_plan("PLAN gold"), Some("gold".to_string()));
        assert_eq!(extract_plan("planet earth"), None);
    }

    #[test]
    fn test_client_id_first_digits_after_label() {
        assert_eq!(
            extract_client_id("client id #00123 order 999"),
            Some("00123".to_string())
        );
        assert_eq!(extract_client_id("client: 123"), None);
    }

    #[test]
    fn test_garbage_yields_empty_record() {
        let record = MessageParser::new().parse("nothing useful here");
        assert!(record.client_id.is_none());
        assert!(record.plan.is_none());
        assert!(record.value.is_none());
        assert!(record.purchase_date_time.is_none());
        assert!(record.conversion_duration.is_none());
        assert_eq!(record.missing_required().len(), 2);
    }

    #[test]
    fn test_extractors_are_independent() {
        let text = "Purchase date/time: 31/12/2023 23:59\nR$ abc";
        let record = MessageParser::new().parse(text);
        assert!(record.value.is_none());
        assert_eq!(record.purchase_date_time.as_deref(), Some("31/12/2023 23:59"));
    }
}
