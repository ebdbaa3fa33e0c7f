use serde::Serialize;
use serde_json::Value;

/// Body of `POST /2/tweets`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTweetRequest<'a> {
    pub text: &'a str,
}

/// The `data` object of a create reply: `{"data": {"id": "...", "text": "..."}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTweet {
    pub id: String,
    pub text: Option<String>,
}

impl CreatedTweet {
    /// Read the created tweet out of a reply. Numeric ids are accepted;
    /// `None` when there is no usable id.
    pub fn from_reply(reply: &Value) -> Option<Self> {
        let data = reply.get("data")?;
        let id = match data.get("id")? {
            Value::String(s) if !s.is_empty() => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        let text = data.get("text").and_then(Value::as_str).map(str::to_string);
        Some(Self { id, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_as_text_object() {
        let body = serde_json::to_value(CreateTweetRequest { text: "hi\nthere" }).unwrap();
        assert_eq!(body, json!({"text": "hi\nthere"}));
    }

    #[test]
    fn reply_with_string_id() {
        let tweet =
            CreatedTweet::from_reply(&json!({"data":{"id":"1445880548472328192","text":"Hello"}}))
                .unwrap();
        assert_eq!(tweet.id, "1445880548472328192");
        assert_eq!(tweet.text.as_deref(), Some("Hello"));
    }

    #[test]
    fn reply_with_numeric_id() {
        let tweet = CreatedTweet::from_reply(&json!({"data":{"id":123}})).unwrap();
        assert_eq!(tweet.id, "123");
        assert!(tweet.text.is_none());
    }

    #[test]
    fn reply_without_usable_id() {
        assert!(CreatedTweet::from_reply(&json!({})).is_none());
        assert!(CreatedTweet::from_reply(&json!({"data":{}})).is_none());
        assert!(CreatedTweet::from_reply(&json!({"data":{"id":null}})).is_none());
        assert!(CreatedTweet::from_reply(&json!([1, 2])).is_none());
    }
}
