use serde_json::json;

const GEMINI_MODEL: &str = "gemini-2.5-flash";
const PROMPT: &str = "Tell me a short, interesting, and little-known fun fact about \
     Morse code, suitable for a general audience. Make it just one or two sentences long.";

const MISSING_KEY_MESSAGE: &str =
    "API Key is not configured. This feature is currently unavailable.";
const FAILURE_MESSAGE: &str = "Could not fetch a fun fact at this time. Please try again later.";

/// Fetch a short Morse fun fact from the Gemini API.
///
/// Always returns displayable text: a missing `GEMINI_API_KEY` or any
/// request failure comes back as a fixed explanatory sentence instead of
/// an error, so callers never have to branch.
pub fn fetch_fun_fact() -> String {
    let Ok(api_key) = std::env::var("GEMINI_API_KEY") else {
        eprintln!("[funfact] GEMINI_API_KEY not set, feature disabled");
        return MISSING_KEY_MESSAGE.to_string();
    };

    match request_fact(&api_key) {
        Ok(fact) => fact,
        Err(e) => {
            eprintln!("[funfact] request failed: {}", e);
            FAILURE_MESSAGE.to_string()
        }
    }
}

fn request_fact(api_key: &str) -> Result<String, Box<dyn std::error::Error>> {
    let url = format!(
        "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
        GEMINI_MODEL
    );

    let body = json!({
        "contents": [{
            "parts": [{ "text": PROMPT }]
        }]
    });

    let mut response = ureq::post(&url)
        .header("x-goog-api-key", api_key)
        .send_json(body)?;

    let parsed: serde_json::Value = response.body_mut().read_json()?;

    // candidates[0].content.parts[0].text
    let text = parsed["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .ok_or("response contained no text")?;

    Ok(text.trim().to_string())
}
