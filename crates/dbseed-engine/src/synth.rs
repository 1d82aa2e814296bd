use chrono::{Duration, NaiveDate, NaiveTime};
use fake::Fake;
use fake::faker::address::en::{CityName, CountryName, StreetName, ZipCode};
use fake::faker::company::en::{CompanyName, Profession};
use fake::faker::internet::en::{FreeEmail, Username};
use fake::faker::lorem::en::{Sentence, Word};
use fake::faker::name::en::{FirstName, LastName, Name};
use fake::faker::phone_number::en::PhoneNumber;
use rand::{Rng, RngCore};

use crate::value::ScalarValue;

/// Produces a scalar for a column that is neither a foreign key nor
/// database-assigned. Pure with respect to schema; randomized internally.
pub trait ValueSynthesizer: Send + Sync {
    fn synthesize(&self, field_name: &str, data_type: &str, rng: &mut dyn RngCore) -> ScalarValue;
}

type RuleFn = fn(&mut dyn RngCore) -> ScalarValue;

/// Field-name rules, consulted before the type fallback. Matching is ranked:
/// an exact (case-insensitive) name match wins outright; otherwise the rule
/// whose name is the longest substring of the field name wins.
const NAME_RULES: &[(&str, RuleFn)] = &[
    ("first_name", |rng| text(FirstName().fake_with_rng(rng))),
    ("last_name", |rng| text(LastName().fake_with_rng(rng))),
    ("username", |rng| text(Username().fake_with_rng(rng))),
    ("name", |rng| text(Name().fake_with_rng(rng))),
    ("email", |rng| text(FreeEmail().fake_with_rng(rng))),
    ("phone", |rng| text(PhoneNumber().fake_with_rng(rng))),
    ("street", |rng| text(StreetName().fake_with_rng(rng))),
    ("address", |rng| address(rng)),
    ("city", |rng| text(CityName().fake_with_rng(rng))),
    ("country", |rng| text(CountryName().fake_with_rng(rng))),
    ("zip", |rng| text(ZipCode().fake_with_rng(rng))),
    ("postcode", |rng| text(ZipCode().fake_with_rng(rng))),
    ("company", |rng| text(CompanyName().fake_with_rng(rng))),
    ("profession", |rng| text(Profession().fake_with_rng(rng))),
    ("description", |rng| text(Sentence(3..8).fake_with_rng(rng))),
    ("title", |rng| text(Sentence(2..5).fake_with_rng(rng))),
    ("url", |rng| url(rng)),
    ("price", |rng| money(rng)),
    ("amount", |rng| money(rng)),
    ("quantity", |rng| ScalarValue::Int(rng.random_range(1..=500))),
    ("age", |rng| ScalarValue::Int(rng.random_range(18..=90))),
];

/// Ranked-rule synthesizer: exact field-name match, then longest-substring
/// match, then a fallback keyed on the declared SQL type.
#[derive(Debug, Default, Clone)]
pub struct SynthRegistry;

impl SynthRegistry {
    pub fn new() -> Self {
        Self
    }

    fn name_rule(field_name: &str) -> Option<RuleFn> {
        let field = field_name.to_ascii_lowercase();

        if let Some((_, rule)) = NAME_RULES.iter().find(|(name, _)| *name == field) {
            return Some(*rule);
        }

        NAME_RULES
            .iter()
            .filter(|(name, _)| field.contains(name))
            .max_by_key(|(name, _)| name.len())
            .map(|(_, rule)| *rule)
    }
}

impl ValueSynthesizer for SynthRegistry {
    fn synthesize(&self, field_name: &str, data_type: &str, rng: &mut dyn RngCore) -> ScalarValue {
        if let Some(rule) = Self::name_rule(field_name) {
            return rule(rng);
        }
        fallback_for_type(data_type, rng)
    }
}

fn fallback_for_type(data_type: &str, rng: &mut dyn RngCore) -> ScalarValue {
    let ty = data_type.to_ascii_lowercase();

    if ty.contains("bool") || ty == "bit" {
        ScalarValue::Bool(rng.random_bool(0.5))
    } else if ty.contains("int") || ty.contains("serial") {
        ScalarValue::Int(rng.random_range(1..=10_000))
    } else if ty.contains("numeric")
        || ty.contains("decimal")
        || ty.contains("real")
        || ty.contains("double")
        || ty.contains("float")
        || ty.contains("money")
    {
        money(rng)
    } else if ty.contains("uuid") {
        ScalarValue::Uuid(random_uuid(rng))
    } else if ty.contains("json") {
        ScalarValue::Json(serde_json::json!({ "key": Word().fake_with_rng::<String, _>(rng) }))
    } else if ty.contains("timestamp") || ty == "datetime" {
        ScalarValue::Timestamp(
            random_date(rng)
                .and_hms_opt(
                    rng.random_range(0..24),
                    rng.random_range(0..60),
                    rng.random_range(0..60),
                )
                .unwrap_or_default(),
        )
    } else if ty.contains("date") {
        ScalarValue::Date(random_date(rng))
    } else if ty.contains("time") {
        ScalarValue::Time(
            NaiveTime::from_hms_opt(
                rng.random_range(0..24),
                rng.random_range(0..60),
                rng.random_range(0..60),
            )
            .unwrap_or_default(),
        )
    } else {
        text(Word().fake_with_rng(rng))
    }
}

fn text(value: String) -> ScalarValue {
    ScalarValue::Text(value)
}

fn address(rng: &mut dyn RngCore) -> ScalarValue {
    let street: String = StreetName().fake_with_rng(rng);
    let number = rng.random_range(1..=9999);
    ScalarValue::Text(format!("{number} {street}"))
}

fn url(rng: &mut dyn RngCore) -> ScalarValue {
    let slug: String = Word().fake_with_rng(rng);
    ScalarValue::Text(format!("https://{slug}.example.com"))
}

fn money(rng: &mut dyn RngCore) -> ScalarValue {
    let cents = rng.random_range(0..=1_000_000_i64);
    ScalarValue::Float(cents as f64 / 100.0)
}

fn random_date(rng: &mut dyn RngCore) -> NaiveDate {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    base - Duration::days(rng.random_range(0..3_650))
}

fn random_uuid(rng: &mut dyn RngCore) -> String {
    let mut bytes = [0_u8; 16];
    rng.fill_bytes(&mut bytes);
    uuid::Builder::from_random_bytes(bytes).into_uuid().to_string()
}
