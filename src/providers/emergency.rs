//! Built-in emergency numbers, consulted before the advisory oracle.

use crate::models::EmergencyContacts;

// ---

struct Entry {
    key: &'static str,
    ambulance: &'static str,
    police: &'static str,
    general: &'static str,
    notes: &'static str,
}

impl Entry {
    fn to_contacts(&self) -> EmergencyContacts {
        EmergencyContacts {
            ambulance: self.ambulance.to_string(),
            police: self.police.to_string(),
            general: self.general.to_string(),
            notes: self.notes.to_string(),
        }
    }
}

const fn entry(
    key: &'static str,
    ambulance: &'static str,
    police: &'static str,
    general: &'static str,
    notes: &'static str,
) -> Entry {
    Entry {
        key,
        ambulance,
        police,
        general,
        notes,
    }
}

const AU_NOTE: &str = "Dial 000 for all emergencies in Australia.";
const US_NOTE: &str = "Dial 911 for all emergencies.";

static CITIES: &[Entry] = &[
    entry("Sydney", "000", "000", "000", AU_NOTE),
    entry("Melbourne", "000", "000", "000", AU_NOTE),
    entry("Mumbai", "108", "100", "112", "108 is for Ambulance, 100 for Police. 112 is National Emergency."),
    entry("Delhi", "102", "100", "112", "102 for Ambulance, 100 for Police."),
    entry("Bangalore", "108", "100", "112", "108 for Ambulance."),
    entry("London", "999", "999", "999", "Dial 999 for emergencies. 111 for non-emergency medical advice."),
    entry("New York", "911", "911", "911", US_NOTE),
    entry("San Francisco", "911", "911", "911", US_NOTE),
    entry("Singapore", "995", "999", "995", "995 for Ambulance/Fire, 999 for Police."),
    entry("Dubai", "998", "999", "999", "998 for Ambulance, 999 for Police."),
];

/// Keyed by ISO 3166-1 alpha-2 code.
static COUNTRIES: &[Entry] = &[
    entry("IN", "112", "100", "112", "Dial 112 for National Emergency."),
    entry("US", "911", "911", "911", US_NOTE),
    entry("GB", "999", "999", "999", "Dial 999 for emergencies."),
    entry("AU", "000", "000", "000", "Dial 000 for all emergencies."),
    entry("SG", "995", "999", "995", "995 for Ambulance."),
    entry("AE", "998", "999", "999", "998 for Ambulance."),
];

/// Look up numbers for a city, then for its country code.
///
/// City names match case-insensitively; `None` means the oracle should be asked.
pub fn lookup(city: &str, country: &str) -> Option<EmergencyContacts> {
    // ---
    let city = city.trim();
    let country = country.trim();

    CITIES
        .iter()
        .find(|e| e.key.eq_ignore_ascii_case(city))
        .or_else(|| COUNTRIES.iter().find(|e| e.key.eq_ignore_ascii_case(country)))
        .map(Entry::to_contacts)
}

/// Returned when neither the tables nor the oracle can answer.
pub fn fallback_contacts() -> EmergencyContacts {
    EmergencyContacts {
        ambulance: "112".to_string(),
        police: "112".to_string(),
        general: "112".to_string(),
        notes: "Could not fetch local numbers. Dial 112 for international emergency.".to_string(),
    }
}
