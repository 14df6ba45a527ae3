use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Product;

const FALLBACK_REPLY: &str = "I'm here to help with all your Chin-Chin needs! \
Feel free to ask about our flavors or managing your cart. 🍪";

const OUTAGE_REPLY: &str = "I'm having a brief moment of silence while I refresh. \
In the meantime, remember I can help you find flavors, add items to your cart, \
or navigate the shop! 🍪\n\nPlease try your request again.";

/// Client-executed intent decoded from the model's tool call. The server
/// never mutates state on behalf of the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantAction {
    Navigate { url: String },
    AddToCart { product_id: Uuid, quantity: i32 },
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatReply {
    pub content: String,
    pub action: Option<AssistantAction>,
}

#[derive(Debug, Serialize)]
struct OutboundMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ModelMessage,
}

#[derive(Debug, Deserialize)]
struct ModelMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    arguments: String,
}

/// Proxy to an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct AssistantClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl AssistantClient {
    pub fn new(base_url: String, api_key: Option<String>, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
            model,
        }
    }

    pub async fn chat(
        &self,
        products: &[Product],
        message: &str,
        history: &[ChatTurn],
    ) -> ChatReply {
        let Some(api_key) = self.api_key.as_deref() else {
            return ChatReply {
                content: "AI is not configured yet.".to_string(),
                action: None,
            };
        };

        let mut messages = vec![OutboundMessage {
            role: "system",
            content: system_prompt(products),
        }];
        for turn in history {
            messages.push(OutboundMessage {
                role: match turn.role {
                    ChatRole::User => "user",
                    ChatRole::Assistant => "assistant",
                },
                content: turn.content.clone().unwrap_or_default(),
            });
        }
        messages.push(OutboundMessage {
            role: "user",
            content: message.to_string(),
        });

        let body = json!({
            "model": self.model,
            "messages": messages,
            "tools": tool_definitions(),
            "tool_choice": "auto",
            "temperature": 0.7,
        });

        let url = format!("{}/chat/completions", self.base_url);
        let response = match self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) => {
                tracing::warn!(error = %err, "assistant request failed");
                return ChatReply {
                    content: OUTAGE_REPLY.to_string(),
                    action: None,
                };
            }
        };

        let completion: ChatCompletionResponse = match response.json().await {
            Ok(c) => c,
            Err(err) => {
                tracing::warn!(error = %err, "assistant response decode failed");
                return ChatReply {
                    content: OUTAGE_REPLY.to_string(),
                    action: None,
                };
            }
        };

        let Some(choice) = completion.choices.into_iter().next() else {
            return ChatReply {
                content: OUTAGE_REPLY.to_string(),
                action: None,
            };
        };

        let mut content = choice.message.content.unwrap_or_default();
        let action = choice
            .message
            .tool_calls
            .first()
            .and_then(|call| decode_action(&call.function.name, &call.function.arguments));

        if content.is_empty() {
            content = match &action {
                Some(AssistantAction::Navigate { url }) => {
                    format!("Sure! Taking you to {url}...")
                }
                Some(AssistantAction::AddToCart { quantity, .. }) => {
                    format!("I've added {quantity}x to your cart! 🛒")
                }
                None => FALLBACK_REPLY.to_string(),
            };
        }

        ChatReply { content, action }
    }
}

/// Decode a model tool call into a typed intent. Unknown tool names and
/// malformed arguments are dropped rather than guessed at.
fn decode_action(name: &str, arguments: &str) -> Option<AssistantAction> {
    #[derive(Deserialize)]
    struct NavigateArgs {
        url: String,
    }

    fn default_quantity() -> i32 {
        1
    }

    #[derive(Deserialize)]
    struct AddToCartArgs {
        product_id: Uuid,
        #[serde(default = "default_quantity")]
        quantity: i32,
    }

    match name {
        "navigate" => {
            let args: NavigateArgs = serde_json::from_str(arguments).ok()?;
            Some(AssistantAction::Navigate { url: args.url })
        }
        "add_to_cart" => {
            let args: AddToCartArgs = serde_json::from_str(arguments).ok()?;
            Some(AssistantAction::AddToCart {
                product_id: args.product_id,
                quantity: args.quantity.max(1),
            })
        }
        _ => None,
    }
}

fn system_prompt(products: &[Product]) -> String {
    let product_context = products
        .iter()
        .map(|p| {
            format!(
                "- {} (Price: ₦{}) [ID: {}]: {}",
                p.name,
                p.price / 100,
                p.id,
                p.description.as_deref().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are the Chin-Chin Guide, a helpful and friendly AI assistant for \
\"Chin-Chin\", an e-commerce store selling premium Nigerian snacks.\n\n\
Information about our products (IMPORTANT: use the exact [ID] for tools):\n\
{product_context}\n\n\
Guidelines:\n\
1. Be polite, energetic, and helpful.\n\
2. If someone asks for recommendations, use the product list provided.\n\
3. NEVER display the technical [ID] in conversation. It is for tool use only.\n\
4. If you don't know the answer, ask them to contact support@chinchin.com.\n\
5. Keep responses concise and engaging.\n\n\
Navigation: use the 'navigate' tool with one of these routes:\n\
/, /dashboard, /dashboard/cart, /dashboard/orders, /dashboard/support, /dashboard/products\n\n\
Add to cart: use the 'add_to_cart' tool. Always ask for confirmation first \
unless the user explicitly says to add the item. After adding, ask if they'd \
like to check out or keep browsing."
    )
}

fn tool_definitions() -> serde_json::Value {
    json!([
        {
            "type": "function",
            "function": {
                "name": "navigate",
                "description": "Navigate the user to a specific page on the website.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "url": {
                            "type": "string",
                            "description": "The relative URL to navigate to."
                        }
                    },
                    "required": ["url"]
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "add_to_cart",
                "description": "Add a product to the user's shopping cart.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "product_id": {
                            "type": "string",
                            "description": "The [ID] of the product to add."
                        },
                        "quantity": {
                            "type": "number",
                            "description": "The quantity to add (default is 1)."
                        }
                    },
                    "required": ["product_id"]
                }
            }
        }
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_navigate_call() {
        let action = decode_action("navigate", r#"{"url": "/dashboard/cart"}"#);
        assert_eq!(
            action,
            Some(AssistantAction::Navigate {
                url: "/dashboard/cart".to_string()
            })
        );
    }

    #[test]
    fn decodes_add_to_cart_with_default_quantity() {
        let id = Uuid::new_v4();
        let action = decode_action("add_to_cart", &format!(r#"{{"product_id": "{id}"}}"#));
        assert_eq!(
            action,
            Some(AssistantAction::AddToCart {
                product_id: id,
                quantity: 1
            })
        );
    }

    #[test]
    fn drops_unknown_tools_and_bad_arguments() {
        assert_eq!(decode_action("delete_account", "{}"), None);
        assert_eq!(decode_action("navigate", "not json"), None);
        assert_eq!(decode_action("add_to_cart", r#"{"product_id": "nope"}"#), None);
    }
}
