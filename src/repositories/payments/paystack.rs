use crate::models::paystack::Checkout;

use anyhow::bail;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha512;

pub struct PaystackApi {
    secret_key: String,
    url: String,
    client: reqwest::Client,
}

impl PaystackApi {
    pub fn new(secret_key: String, url: String) -> Self {
        Self {
            secret_key,
            url,
            client: reqwest::Client::new(),
        }
    }

    pub async fn initialize(
        &self,
        email: &str,
        amount: i64,
        user_id: &str,
    ) -> Result<Checkout, anyhow::Error> {
        let payload = json!({
            "email": email,
            "amount": amount,
            "metadata": {
                "user_id": user_id,
                "type": "topup"
            }
        });

        let response = self
            .client
            .post(format!("{}/transaction/initialize", self.url))
            .bearer_auth(&self.secret_key)
            .json(&payload)
            .send()
            .await?
            .text()
            .await?;

        let response_json: serde_json::Value = serde_json::from_str(&response)?;
        match response_json.get("data") {
            Some(data) if response_json["status"] == true => {
                let checkout: Checkout = serde_json::from_value(data.clone())?;
                Ok(checkout)
            }
            _ => bail!("Paystack: Bad response format."),
        }
    }
}

/// Webhook authenticity check: the `x-paystack-signature` header is the hex
/// HMAC-SHA512 of the raw body under the secret key.
pub fn verify_signature(secret_key: &str, body: &[u8], signature: &str) -> bool {
    let mut mac = match Hmac::<Sha512>::new_from_slice(secret_key.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(body);

    let expected = hex::encode(mac.finalize().into_bytes());
    expected.eq_ignore_ascii_case(signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret_key: &str, body: &[u8]) -> String {
        let mut mac = Hmac::<Sha512>::new_from_slice(secret_key.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn accepts_a_valid_signature() {
        let body = br#"{"event":"charge.success"}"#;
        let signature = sign("sk_test_secret", body);
        assert!(verify_signature("sk_test_secret", body, &signature));
        assert!(verify_signature(
            "sk_test_secret",
            body,
            &signature.to_uppercase()
        ));
    }

    #[test]
    fn rejects_a_tampered_body() {
        let signature = sign("sk_test_secret", br#"{"amount":1000}"#);
        assert!(!verify_signature(
            "sk_test_secret",
            br#"{"amount":9000}"#,
            &signature
        ));
    }

    #[test]
    fn rejects_a_wrong_key() {
        let body = br#"{"event":"charge.success"}"#;
        let signature = sign("sk_live_other", body);
        assert!(!verify_signature("sk_test_secret", body, &signature));
    }
}
