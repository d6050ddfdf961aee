pub const TEST_SEED: u64 = 42;

pub const THEMATIC_JSON: &str = r#"{
  "themes": ["longing", "city lights", "second chances"],
  "moods": ["nostalgic", "hopeful"],
  "scene": "a rain-streaked window above a night street",
  "era": "80s",
  "tempoAdjustment": -6,
  "intent": "a quiet kind of hope",
  "energyLevel": "slow build",
  "vocalCharacter": "breathy and close"
}"#;

pub const SCRIPTED_TITLE: &str = "Second Chances";

pub const SCRIPTED_LYRICS: &str = "[Verse 1]\nStreetlights hum a song we used to know\n\n[Chorus]\nStay a little longer";
