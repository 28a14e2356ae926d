use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::{CalendarDay, ValidationError};

/// Creation request as it arrives on the wire.
///
/// Every field is optional raw JSON here so that a missing or wrong-typed
/// field is reported as a `ValidationError` by
/// [`CreateReservationRequest::validate`] instead of a decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    #[serde(alias = "nome")]
    pub customer_name: Option<Value>,
    #[serde(alias = "telefone")]
    pub phone: Option<Value>,
    pub email: Option<Value>,
    #[serde(alias = "servico")]
    pub service_type: Option<Value>,
    #[serde(alias = "data")]
    pub date: Option<Value>,
    #[serde(alias = "horario")]
    pub time_slot: Option<Value>,
    #[serde(alias = "valor")]
    pub amount: Option<Value>,
}

/// A creation request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    pub customer_name: String,
    pub phone: String,
    pub email: String,
    pub service_type: String,
    pub date: CalendarDay,
    pub time_slot: String,
    pub amount: Decimal,
}

impl CreateReservationRequest {
    /// Check presence of every field and parse date and amount.
    ///
    /// Fields are checked in declaration order; the first failure is returned.
    pub fn validate(&self) -> Result<NewReservation, ValidationError> {
        let customer_name = required("customerName", &self.customer_name)?;
        let phone = required("phone", &self.phone)?;
        let email = required("email", &self.email)?;
        let service_type = required("serviceType", &self.service_type)?;
        let date = required("date", &self.date)?.parse::<CalendarDay>()?;
        let time_slot = required("timeSlot", &self.time_slot)?;
        let amount = parse_amount(self.amount.as_ref())?;

        Ok(NewReservation {
            customer_name,
            phone,
            email,
            service_type,
            date,
            time_slot,
            amount,
        })
    }
}

/// Text fields take strings or bare numbers (phone numbers often arrive as
/// JSON numbers); anything else is refused.
fn required(field: &'static str, value: &Option<Value>) -> Result<String, ValidationError> {
    let text = match value {
        None | Some(Value::Null) => return Err(ValidationError::MissingField(field)),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => return Err(ValidationError::InvalidField(field)),
    };

    if text.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(text)
}

fn parse_amount(value: Option<&Value>) -> Result<Decimal, ValidationError> {
    let amount = match value {
        None | Some(Value::Null) => return Err(ValidationError::MissingField("amount")),
        Some(Value::Number(n)) => parse_decimal(&n.to_string())?,
        Some(Value::String(s)) if s.trim().is_empty() => {
            return Err(ValidationError::MissingField("amount"))
        }
        Some(Value::String(s)) => parse_decimal(s.trim())?,
        Some(other) => return Err(ValidationError::InvalidAmount(other.to_string())),
    };

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ValidationError::NegativeAmount(amount));
    }
    Ok(amount)
}

fn parse_decimal(raw: &str) -> Result<Decimal, ValidationError> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| ValidationError::InvalidAmount(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_body() -> Value {
        json!({
            "customerName": "Ana",
            "phone": "555-0100",
            "email": "ana@example.com",
            "serviceType": "haircut",
            "date": "2024-06-01",
            "timeSlot": "10:00",
            "amount": 50.0
        })
    }

    fn request(body: Value) -> CreateReservationRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_valid_request() {
        let new = request(full_body()).validate().unwrap();
        assert_eq!(new.customer_name, "Ana");
        assert_eq!(new.date, CalendarDay::from_ymd(2024, 6, 1).unwrap());
        assert_eq!(new.time_slot, "10:00");
        assert_eq!(new.amount, Decimal::from_str("50.0").unwrap());
    }

    #[test]
    fn test_missing_email() {
        let mut body = full_body();
        body.as_object_mut().unwrap().remove("email");
        assert_eq!(
            request(body).validate(),
            Err(ValidationError::MissingField("email"))
        );
    }

    #[test]
    fn test_blank_field_counts_as_missing() {
        let mut body = full_body();
        body["timeSlot"] = json!("   ");
        assert_eq!(
            request(body).validate(),
            Err(ValidationError::MissingField("timeSlot"))
        );
    }

    #[test]
    fn test_text_field_types() {
        let mut body = full_body();
        body["phone"] = json!(5550100);
        assert_eq!(request(body.clone()).validate().unwrap().phone, "5550100");

        body["phone"] = json!(["555"]);
        assert_eq!(
            request(body.clone()).validate(),
            Err(ValidationError::InvalidField("phone"))
        );

        body["phone"] = json!("555-0100");
        body["date"] = json!(true);
        assert_eq!(
            request(body).validate(),
            Err(ValidationError::InvalidField("date"))
        );
    }

    #[test]
    fn test_amount_forms() {
        let mut body = full_body();

        body["amount"] = json!("79.90");
        assert_eq!(
            request(body.clone()).validate().unwrap().amount,
            Decimal::from_str("79.90").unwrap()
        );

        body["amount"] = json!(0);
        assert_eq!(request(body.clone()).validate().unwrap().amount, Decimal::ZERO);

        body["amount"] = json!("fifty");
        assert!(matches!(
            request(body.clone()).validate(),
            Err(ValidationError::InvalidAmount(_))
        ));

        body["amount"] = json!(-5);
        assert!(matches!(
            request(body.clone()).validate(),
            Err(ValidationError::NegativeAmount(_))
        ));

        body["amount"] = json!(true);
        assert!(matches!(
            request(body.clone()).validate(),
            Err(ValidationError::InvalidAmount(_))
        ));

        body["amount"] = Value::Null;
        assert_eq!(
            request(body).validate(),
            Err(ValidationError::MissingField("amount"))
        );
    }

    #[test]
    fn test_invalid_date() {
        let mut body = full_body();
        body["date"] = json!("01/06/2024");
        assert!(matches!(
            request(body).validate(),
            Err(ValidationError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_portuguese_field_names() {
        let body = json!({
            "nome": "Ana",
            "telefone": "555-0100",
            "email": "ana@example.com",
            "servico": "haircut",
            "data": "2024-06-01T00:00:00.000Z",
            "horario": "10:00",
            "valor": "50"
        });
        let new = request(body).validate().unwrap();
        assert_eq!(new.service_type, "haircut");
        assert_eq!(new.amount, Decimal::from(50));
    }
}
