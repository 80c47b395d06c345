use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

/// Ids are resolved in batches of this many per request to bound URL size.
const LOOKUP_BATCH: usize = 200;

#[derive(Debug, Clone, Default)]
pub struct CharacterInfo {
    pub id: String,
    pub name: String,
    pub faction: String,
    pub outfit_tag: String,
    pub online: bool,
}

impl CharacterInfo {
    /// Placeholder for an identity the provider could not resolve.
    pub fn unknown(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            name: format!("Unknown {id}"),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WeaponInfo {
    pub id: String,
    pub name: String,
}

impl WeaponInfo {
    pub fn unknown(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            name: format!("Unknown {id}"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AchievementInfo {
    pub id: String,
    pub name: String,
}

impl AchievementInfo {
    pub fn unknown(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            name: format!("Unknown {id}"),
        }
    }
}

/// Batched request/response lookups against the metadata provider.
///
/// Implementations return only the records they could resolve; callers fall
/// back to the `unknown` placeholders for the rest. Lookups never sit on the
/// ingestion path; report generation joins them at the end.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn characters_by_ids(&self, ids: &[String]) -> Result<Vec<CharacterInfo>>;
    async fn weapons_by_ids(&self, ids: &[String]) -> Result<Vec<WeaponInfo>>;
    async fn achievements_by_ids(&self, ids: &[String]) -> Result<Vec<AchievementInfo>>;
}

/// Census REST implementation.
#[derive(Debug, Clone)]
pub struct CensusDirectory {
    client: reqwest::Client,
    service_id: String,
}

impl CensusDirectory {
    pub fn new(service_id: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .context("failed building census http client")?;
        Ok(Self {
            client,
            service_id: service_id.trim().to_owned(),
        })
    }

    async fn fetch(&self, url: String) -> Result<Value> {
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("census request failed: {url}"))?;
        response
            .json::<Value>()
            .await
            .context("census response was not json")
    }
}

#[async_trait]
impl Directory for CensusDirectory {
    async fn characters_by_ids(&self, ids: &[String]) -> Result<Vec<CharacterInfo>> {
        let mut out = Vec::with_capacity(ids.len());
        for batch in ids.chunks(LOOKUP_BATCH) {
            let url = format!(
                "https://census.daybreakgames.com/{}/get/ps2:v2/character/?character_id={}&c:show=character_id,name.first,faction_id,online_status&c:resolve=outfit",
                self.service_id,
                batch.join(",")
            );
            out.extend(parse_character_list(&self.fetch(url).await?));
        }
        Ok(out)
    }

    async fn weapons_by_ids(&self, ids: &[String]) -> Result<Vec<WeaponInfo>> {
        let mut out = Vec::with_capacity(ids.len());
        for batch in ids.chunks(LOOKUP_BATCH) {
            let url = format!(
                "https://census.daybreakgames.com/{}/get/ps2:v2/item/?item_id={}&c:show=item_id,name.en",
                self.service_id,
                batch.join(",")
            );
            out.extend(parse_weapon_list(&self.fetch(url).await?));
        }
        Ok(out)
    }

    async fn achievements_by_ids(&self, ids: &[String]) -> Result<Vec<AchievementInfo>> {
        let mut out = Vec::with_capacity(ids.len());
        for batch in ids.chunks(LOOKUP_BATCH) {
            let url = format!(
                "https://census.daybreakgames.com/{}/get/ps2:v2/achievement/?achievement_id={}&c:show=achievement_id,name.en",
                self.service_id,
                batch.join(",")
            );
            out.extend(parse_achievement_list(&self.fetch(url).await?));
        }
        Ok(out)
    }
}

fn list_field<'a>(root: &'a Value, name: &str) -> &'a [Value] {
    root.get(name)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn str_at<'a>(value: &'a Value, path: &[&str]) -> &'a str {
    let mut cursor = value;
    for key in path {
        match cursor.get(key) {
            Some(next) => cursor = next,
            None => return "",
        }
    }
    cursor.as_str().unwrap_or_default()
}

pub(crate) fn faction_tag(faction_id: &str) -> &'static str {
    match faction_id {
        "1" => "VS",
        "2" => "NC",
        "3" => "TR",
        "4" => "NSO",
        _ => "",
    }
}

fn parse_character_list(root: &Value) -> Vec<CharacterInfo> {
    list_field(root, "character_list")
        .iter()
        .filter_map(|entry| {
            let id = str_at(entry, &["character_id"]);
            if id.is_empty() {
                return None;
            }
            Some(CharacterInfo {
                id: id.to_owned(),
                name: str_at(entry, &["name", "first"]).to_owned(),
                faction: faction_tag(str_at(entry, &["faction_id"])).to_owned(),
                outfit_tag: str_at(entry, &["outfit", "alias"]).to_owned(),
                online: !matches!(str_at(entry, &["online_status"]), "" | "0"),
            })
        })
        .collect()
}

fn parse_weapon_list(root: &Value) -> Vec<WeaponInfo> {
    list_field(root, "item_list")
        .iter()
        .filter_map(|entry| {
            let id = str_at(entry, &["item_id"]);
            if id.is_empty() {
                return None;
            }
            Some(WeaponInfo {
                id: id.to_owned(),
                name: str_at(entry, &["name", "en"]).to_owned(),
            })
        })
        .collect()
}

fn parse_achievement_list(root: &Value) -> Vec<AchievementInfo> {
    list_field(root, "achievement_list")
        .iter()
        .filter_map(|entry| {
            let id = str_at(entry, &["achievement_id"]);
            if id.is_empty() {
                return None;
            }
            Some(AchievementInfo {
                id: id.to_owned(),
                name: str_at(entry, &["name", "en"]).to_owned(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{parse_character_list, parse_weapon_list, CharacterInfo};

    #[test]
    fn parses_character_list_payload() {
        let root = serde_json::json!({
            "character_list": [
                {
                    "character_id": "5428010",
                    "name": { "first": "TestHeavy" },
                    "faction_id": "1",
                    "online_status": "17",
                    "outfit": { "alias": "L33T" }
                },
                {
                    "character_id": "5428011",
                    "name": { "first": "TestMedic" },
                    "faction_id": "2",
                    "online_status": "0"
                }
            ],
            "returned": 2
        });
        let parsed = parse_character_list(&root);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].name, "TestHeavy");
        assert_eq!(parsed[0].faction, "VS");
        assert_eq!(parsed[0].outfit_tag, "L33T");
        assert!(parsed[0].online);
        assert!(!parsed[1].online);
        assert!(parsed[1].outfit_tag.is_empty());
    }

    #[test]
    fn parses_weapon_list_payload() {
        let root = serde_json::json!({
            "item_list": [
                { "item_id": "7169", "name": { "en": "Orion VS54" } }
            ]
        });
        let parsed = parse_weapon_list(&root);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name, "Orion VS54");
    }

    #[test]
    fn unknown_placeholder_carries_the_id() {
        let unknown = CharacterInfo::unknown("12345");
        assert_eq!(unknown.name, "Unknown 12345");
        assert!(!unknown.online);
    }
}
