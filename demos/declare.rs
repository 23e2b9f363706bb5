//! Declaring attributes: builders, pipeline shapes, hooks, events and proxying
//!
//! This example demonstrates:
//! - Shortcut and builder declarations
//! - The write pipeline shape each declaration compiles to
//! - Change-gated write hooks
//! - Listener rewiring when a nested value is replaced
//! - Proxying nested members onto the host

use attrkit::*;
use std::sync::{Arc, Mutex};

struct Address {
    city: Mutex<String>,
}

impl Nested for Address {
    fn kind(&self) -> &str {
        "Address"
    }

    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "city" => Some(Value::from(self.city.lock().ok()?.clone())),
            _ => None,
        }
    }

    fn set_property(&self, name: &str, value: Value) -> Result<(), AttrError> {
        match (name, self.city.lock()) {
            ("city", Ok(mut city)) => {
                *city = value.as_str().unwrap_or_default().to_string();
                Ok(())
            }
            _ => Err(AttrError::MissingMember {
                attribute: "Address".into(),
                member: name.into(),
            }),
        }
    }

    fn invoke(&self, method: &str, _call: Call<'_>) -> Option<Result<Value, AttrError>> {
        match method {
            "label" => Some(
                self.city
                    .lock()
                    .map(|city| Value::from(format!("Address in {city}")))
                    .map_err(|e| AttrError::Hook("label".into(), e.to_string())),
            ),
            _ => None,
        }
    }

    fn is_triggerable(&self) -> bool {
        true
    }
}

fn main() -> Result<(), AttrError> {
    println!("=== Attribute Declaration Demo ===\n");

    // ===== Declarations =====
    println!("1. Declarations and pipeline shapes\n");

    let address = Arc::new(
        ValueType::new("Address")
            .with_method("label")
            .with_property("city"),
    );

    let name = create(Value::from("anonymous"), "name");
    let age = primitives::number()
        .value(0)
        .check(|_, v, _| v.as_f64().map_or(false, |n| n >= 0.0), "age must be positive")
        .create_attribute("age");
    let visits = primitives::number()
        .value(0)
        .set(|_, v: Value, _| Ok(v.as_f64().map(|n| Value::from(n as i64 + 1))))
        .create_attribute("visits");
    let home = address
        .has()
        .proxy(true)
        .events(events("change", |model: &mut dyn Model, _: &[Value]| {
            model.trigger("home:changed", &[]);
            Ok(())
        }))
        .create_attribute("home");
    let notes = Options::new().create_attribute("notes");

    for attr in [&name, &age, &visits, &home, &notes] {
        println!("  {:<8} -> {}", attr.name(), attr.shape());
    }
    println!();

    let class = Arc::new(
        ClassSpec::new("Person")
            .with_attribute(name)
            .with_attribute(age)
            .with_attribute(visits)
            .with_attribute(home)
            .with_attribute(notes),
    );
    let mut person = Record::new(class);

    // ===== Casts and hooks =====
    println!("2. Casts and change-gated hooks\n");

    person.set("age", Value::from("42"))?;
    println!("  age set from \"42\": {:?}", person.get("age")?);

    person.set("visits", Value::from("5"))?;
    println!("  visits after \"5\": {:?}", person.get("visits")?);
    person.set("visits", Value::from("6"))?;
    println!("  visits after \"6\": {:?} (unchanged, hook skipped)", person.get("visits")?);

    person.set("age", Value::from(-1))?;
    println!("  age -1 validates as: {:?}\n", person.validate("age"));

    // ===== Events =====
    println!("3. Nested values and events\n");

    let first: Arc<dyn Nested> = Arc::new(Address {
        city: Mutex::new("Lisbon".into()),
    });
    let second: Arc<dyn Nested> = Arc::new(Address {
        city: Mutex::new("Porto".into()),
    });

    person.set("home", Value::Object(first.clone()))?;
    person.set("home", Value::Object(second.clone()))?;
    person.deliver(&second, "change", &[])?;

    println!("  listeners on old home: {:?}", person.listeners(&first));
    println!("  listeners on new home: {:?}", person.listeners(&second));
    for triggered in person.triggered() {
        println!("  event: {}", triggered.event);
    }
    println!();

    // ===== Proxying =====
    println!("4. Proxied members\n");

    println!("  label(): {:?}", person.call("label", &[])?);
    person.set_proxied("city", Value::from("Braga"))?;
    println!("  city: {:?}", person.proxied("city")?);

    Ok(())
}
