use crate::lib::environment::Environment;
use crate::lib::error::FabgateResult;
use clap::Parser;
use fabgate_core::TransactionDescriptor;
use std::io::Write;

/// Evaluates a contract function as a stored identity and prints the result.
#[derive(Parser)]
pub struct QueryOpts {
    /// The wallet identity to evaluate as.
    identity: String,

    /// The contract function.
    fcn: String,

    /// Arguments to the function, in order.
    args: Vec<String>,
}

pub async fn exec(env: &Environment, opts: QueryOpts) -> FabgateResult {
    let session = env.new_ledger_session(env.get_wallet()?)?;
    let payload = session
        .query(&TransactionDescriptor {
            identity: opts.identity,
            function: opts.fcn,
            args: opts.args,
        })
        .await?;

    std::io::stdout().write_all(&render(payload))?;
    Ok(())
}

/// JSON results are pretty-printed with their key order and numbers as written; anything else
/// is passed through.
fn render(payload: Vec<u8>) -> Vec<u8> {
    match serde_json::from_slice::<serde_json::Value>(&payload)
        .and_then(|json| serde_json::to_vec_pretty(&json))
    {
        Ok(mut pretty) => {
            pretty.push(b'\n');
            pretty
        }
        Err(_) => payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_keeps_key_order_and_precision() {
        let rendered = render(
            br#"{"Size":5,"ID":"asset1","AppraisedValue":123456789012345678901234567890}"#.to_vec(),
        );
        assert_eq!(
            String::from_utf8(rendered).unwrap(),
            "{\n  \"Size\": 5,\n  \"ID\": \"asset1\",\n  \"AppraisedValue\": 123456789012345678901234567890\n}\n"
        );
    }

    #[test]
    fn other_payloads_pass_through() {
        assert_eq!(render(b"plain text".to_vec()), b"plain text".to_vec());
    }
}
