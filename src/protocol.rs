use anyhow::{anyhow, Result};
use serde_json::Value;

/// A raw feed payload classified into the signal it carries, before any
/// routing decision. Identity fields are provider ids; timestamps are
/// converted from the feed's epoch seconds to epoch milliseconds here.
#[derive(Debug, Clone)]
pub enum CensusEvent {
    Death {
        timestamp: i64,
        attacker_id: String,
        victim_id: String,
        attacker_loadout_id: String,
        victim_loadout_id: String,
        weapon_id: String,
        is_headshot: bool,
        zone_id: String,
    },
    Experience {
        timestamp: i64,
        source_id: String,
        target_id: String,
        exp_id: String,
        amount: i64,
        loadout_id: String,
        zone_id: String,
    },
    VehicleDestroy {
        timestamp: i64,
        attacker_id: String,
        attacker_loadout_id: String,
        vehicle_id: String,
        zone_id: String,
    },
    PlayerCapture {
        timestamp: i64,
        character_id: String,
        facility_id: String,
        outfit_id: String,
        zone_id: String,
    },
    PlayerDefend {
        timestamp: i64,
        character_id: String,
        facility_id: String,
        outfit_id: String,
        zone_id: String,
    },
    FacilityControl {
        timestamp: i64,
        facility_id: String,
        zone_id: String,
        old_faction_id: String,
        new_faction_id: String,
        outfit_id: String,
    },
    Login {
        timestamp: i64,
        character_id: String,
    },
    Logout {
        timestamp: i64,
        character_id: String,
    },
    ItemAdded {
        timestamp: i64,
        character_id: String,
        item_id: String,
    },
    Achievement {
        timestamp: i64,
        character_id: String,
        achievement_id: String,
    },
}

/// Classify one raw feed message.
///
/// `Ok(None)` is the quiet path for heartbeats, subscription echoes and
/// event names outside the tracked set. `Err` means the payload was
/// malformed; the caller logs and drops it without touching state.
pub fn classify(raw: &str) -> Result<Option<CensusEvent>> {
    let root: Value =
        serde_json::from_str(raw).map_err(|err| anyhow!("payload is not json: {err}"))?;

    let Some(payload) = root.get("payload") else {
        // Heartbeats, help responses and subscription echoes have no payload.
        return Ok(None);
    };

    let event_name = str_field(payload, "event_name");
    let parsed = match event_name {
        "Death" => Some(CensusEvent::Death {
            timestamp: ms_timestamp(payload)?,
            attacker_id: str_field(payload, "attacker_character_id").to_owned(),
            victim_id: require_field(payload, "character_id")?,
            attacker_loadout_id: str_field(payload, "attacker_loadout_id").to_owned(),
            victim_loadout_id: str_field(payload, "character_loadout_id").to_owned(),
            weapon_id: str_field(payload, "attacker_weapon_id").to_owned(),
            is_headshot: flag_field(payload, "is_headshot"),
            zone_id: str_field(payload, "zone_id").to_owned(),
        }),
        "GainExperience" => Some(CensusEvent::Experience {
            timestamp: ms_timestamp(payload)?,
            source_id: require_field(payload, "character_id")?,
            target_id: str_field(payload, "other_id").to_owned(),
            exp_id: require_field(payload, "experience_id")?,
            amount: int_field(payload, "amount"),
            loadout_id: str_field(payload, "loadout_id").to_owned(),
            zone_id: str_field(payload, "zone_id").to_owned(),
        }),
        "VehicleDestroy" => Some(CensusEvent::VehicleDestroy {
            timestamp: ms_timestamp(payload)?,
            attacker_id: require_field(payload, "attacker_character_id")?,
            attacker_loadout_id: str_field(payload, "attacker_loadout_id").to_owned(),
            vehicle_id: str_field(payload, "vehicle_id").to_owned(),
            zone_id: str_field(payload, "zone_id").to_owned(),
        }),
        "PlayerFacilityCapture" => Some(CensusEvent::PlayerCapture {
            timestamp: ms_timestamp(payload)?,
            character_id: require_field(payload, "character_id")?,
            facility_id: str_field(payload, "facility_id").to_owned(),
            outfit_id: str_field(payload, "outfit_id").to_owned(),
            zone_id: str_field(payload, "zone_id").to_owned(),
        }),
        "PlayerFacilityDefend" => Some(CensusEvent::PlayerDefend {
            timestamp: ms_timestamp(payload)?,
            character_id: require_field(payload, "character_id")?,
            facility_id: str_field(payload, "facility_id").to_owned(),
            outfit_id: str_field(payload, "outfit_id").to_owned(),
            zone_id: str_field(payload, "zone_id").to_owned(),
        }),
        "FacilityControl" => Some(CensusEvent::FacilityControl {
            timestamp: ms_timestamp(payload)?,
            facility_id: require_field(payload, "facility_id")?,
            zone_id: str_field(payload, "zone_id").to_owned(),
            old_faction_id: str_field(payload, "old_faction_id").to_owned(),
            new_faction_id: str_field(payload, "new_faction_id").to_owned(),
            outfit_id: str_field(payload, "outfit_id").to_owned(),
        }),
        "PlayerLogin" => Some(CensusEvent::Login {
            timestamp: ms_timestamp(payload)?,
            character_id: require_field(payload, "character_id")?,
        }),
        "PlayerLogout" => Some(CensusEvent::Logout {
            timestamp: ms_timestamp(payload)?,
            character_id: require_field(payload, "character_id")?,
        }),
        "ItemAdded" => Some(CensusEvent::ItemAdded {
            timestamp: ms_timestamp(payload)?,
            character_id: require_field(payload, "character_id")?,
            item_id: str_field(payload, "item_id").to_owned(),
        }),
        "AchievementEarned" => Some(CensusEvent::Achievement {
            timestamp: ms_timestamp(payload)?,
            character_id: require_field(payload, "character_id")?,
            achievement_id: str_field(payload, "achievement_id").to_owned(),
        }),
        _ => None,
    };

    Ok(parsed)
}

fn str_field<'a>(payload: &'a Value, name: &str) -> &'a str {
    payload.get(name).and_then(Value::as_str).unwrap_or_default()
}

fn require_field(payload: &Value, name: &str) -> Result<String> {
    let value = str_field(payload, name).trim();
    if value.is_empty() {
        return Err(anyhow!("payload is missing required field {name}"));
    }
    Ok(value.to_owned())
}

fn int_field(payload: &Value, name: &str) -> i64 {
    match payload.get(name) {
        Some(Value::String(text)) => text.trim().parse().unwrap_or(0),
        Some(Value::Number(num)) => num.as_i64().unwrap_or(0),
        _ => 0,
    }
}

fn flag_field(payload: &Value, name: &str) -> bool {
    str_field(payload, name) == "1"
}

/// The feed stamps events in epoch seconds; the event model keeps epoch
/// milliseconds throughout.
fn ms_timestamp(payload: &Value) -> Result<i64> {
    let seconds: i64 = str_field(payload, "timestamp")
        .trim()
        .parse()
        .map_err(|_| anyhow!("payload has no usable timestamp"))?;
    Ok(seconds * 1000)
}
