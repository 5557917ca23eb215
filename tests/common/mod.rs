use std::fs;
use std::path::PathBuf;

use serde_json::{json, Value};
use tempfile::TempDir;

use askcsv::config::Config;

pub const LISTINGS_CSV: &str = "\
name,city,price,rooms,available
Loft,Austin,120.5,1,true
Cottage,Denver,95,2,false
Villa,Austin,310,4,true
Studio,Boston,,1,true
Cabin,Denver,80,2,false
Bungalow,Austin,150,3,true
";

pub const LISTINGS_DICTIONARY: &str = "\
name: listing name
city: city the listing is in
price: nightly price in USD
rooms: number of bedrooms
available: true if the listing can be booked
";

/// Temp dir holding the listings dataset, its dictionary and an empty ledger path
#[allow(dead_code)]
pub struct Fixture {
    pub dir: TempDir,
    pub dataset: PathBuf,
    pub dictionary: PathBuf,
    pub ledger: PathBuf,
}

#[allow(dead_code)]
pub fn listings_fixture() -> Fixture {
    let dir = TempDir::new().expect("failed to create tempdir");
    let dataset = dir.path().join("data_csv.csv");
    let dictionary = dir.path().join("dictionary.txt");
    fs::write(&dataset, LISTINGS_CSV).expect("failed to write dataset");
    fs::write(&dictionary, LISTINGS_DICTIONARY).expect("failed to write dictionary");
    let ledger = dir.path().join("usage").join("usage.jsonl");
    Fixture {
        dir,
        dataset,
        dictionary,
        ledger,
    }
}

/// Config pointing at the fixture and a mock Ollama server
#[allow(dead_code)]
pub fn ollama_config(fixture: &Fixture, host: &str) -> Config {
    let mut config = Config::default();
    config.provider.provider_type = "ollama".to_string();
    config.provider.ollama.host = host.to_string();
    config.models.fast = "llama3.2:3b".to_string();
    config.models.accurate = "llama3.3:70b".to_string();
    config.data.dataset_path = fixture.dataset.clone();
    config.data.dictionary_path = fixture.dictionary.clone();
    config.data.as_of_date = Some("2023-06-01".to_string());
    config.usage.log_path = Some(fixture.ledger.clone());
    config
}

/// Config pointing at the fixture and a mock OpenAI-compatible server
///
/// The API key is read from `key_env`.
#[allow(dead_code)]
pub fn openai_config(fixture: &Fixture, api_base: &str, key_env: &str) -> Config {
    let mut config = Config::default();
    config.provider.provider_type = "openai".to_string();
    config.provider.openai.api_base = api_base.to_string();
    config.provider.openai.api_key_env = key_env.to_string();
    config.data.dataset_path = fixture.dataset.clone();
    config.data.dictionary_path = fixture.dictionary.clone();
    config.data.as_of_date = Some("2023-06-01".to_string());
    config.usage.log_path = Some(fixture.ledger.clone());
    config
}

/// OpenAI chat completion carrying a final answer
#[allow(dead_code)]
pub fn openai_answer(content: &str, prompt_tokens: usize, completion_tokens: usize) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {
            "prompt_tokens": prompt_tokens,
            "completion_tokens": completion_tokens,
            "total_tokens": prompt_tokens + completion_tokens
        }
    })
}

/// OpenAI chat completion requesting one tool call
#[allow(dead_code)]
pub fn openai_tool_call(
    id: &str,
    name: &str,
    arguments: Value,
    prompt_tokens: usize,
    completion_tokens: usize,
) -> Value {
    json!({
        "id": "chatcmpl-0",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": id,
                    "type": "function",
                    "function": {"name": name, "arguments": arguments.to_string()}
                }]
            },
            "finish_reason": "tool_calls"
        }],
        "usage": {
            "prompt_tokens": prompt_tokens,
            "completion_tokens": completion_tokens,
            "total_tokens": prompt_tokens + completion_tokens
        }
    })
}

/// Ollama `/api/chat` response carrying a final answer
#[allow(dead_code)]
pub fn ollama_answer(content: &str, prompt_tokens: usize, completion_tokens: usize) -> Value {
    json!({
        "model": "llama3.2:3b",
        "message": {"role": "assistant", "content": content},
        "done": true,
        "prompt_eval_count": prompt_tokens,
        "eval_count": completion_tokens
    })
}

/// Ollama `/api/chat` response requesting one tool call
#[allow(dead_code)]
pub fn ollama_tool_call(name: &str, arguments: Value) -> Value {
    json!({
        "model": "llama3.2:3b",
        "message": {
            "role": "assistant",
            "content": "",
            "tool_calls": [{"function": {"name": name, "arguments": arguments}}]
        },
        "done": true,
        "prompt_eval_count": 200,
        "eval_count": 20
    })
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
