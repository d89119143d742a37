use super::client::{
    BackendReply, BackendRequest, BackendTransport, HttpResponse, ReplyInbox, TransportError,
    push_reply,
};

/// Plain GET over reqwest. Native builds block a short-lived worker thread,
/// WASM builds await the browser fetch on the local executor.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpTransport;

impl BackendTransport for HttpTransport {
    fn get(&self, request: BackendRequest, url: String, inbox: ReplyInbox) {
        #[cfg(not(target_arch = "wasm32"))]
        {
            let spawned = std::thread::Builder::new()
                .name("backend-fetch".into())
                .spawn({
                    let inbox = inbox.clone();
                    let request = request.clone();
                    let url = url.clone();
                    move || {
                        let result = fetch_blocking(&url);
                        push_reply(&inbox, BackendReply { request, result });
                    }
                });

            if let Err(error) = spawned {
                push_reply(
                    &inbox,
                    BackendReply {
                        request,
                        result: Err(TransportError {
                            url,
                            message: format!("could not start fetch thread: {error}"),
                        }),
                    },
                );
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            wasm_bindgen_futures::spawn_local(async move {
                let result = fetch_async(&url).await;
                push_reply(&inbox, BackendReply { request, result });
            });
        }
    }
}

fn transport_error(url: &str, error: reqwest::Error) -> TransportError {
    TransportError {
        url: url.to_string(),
        message: error.to_string(),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn fetch_blocking(url: &str) -> Result<HttpResponse, TransportError> {
    let response = reqwest::blocking::Client::new()
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .map_err(|error| transport_error(url, error))?;
    let status = response.status().as_u16();
    let body = response
        .text()
        .map_err(|error| transport_error(url, error))?;
    Ok(HttpResponse { status, body })
}

#[cfg(target_arch = "wasm32")]
async fn fetch_async(url: &str) -> Result<HttpResponse, TransportError> {
    let response = reqwest::Client::new()
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|error| transport_error(url, error))?;
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|error| transport_error(url, error))?;
    Ok(HttpResponse { status, body })
}
