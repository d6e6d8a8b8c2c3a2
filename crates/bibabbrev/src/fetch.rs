//! Retrieval of the raw abbreviations page.

use crate::{Error, ErrorKind};

use log::trace;

/// A blocking source of page text.
///
/// The builder is generic over the client so that the network can be swapped out, the default
/// being [`reqwest::blocking::Client`].
pub trait Client
where
    Self: Default,
{
    /// Fetch the body of `url` as text.
    ///
    /// # Errors
    ///
    /// An [`Err`] with [`ErrorKind::Network`] is returned when the resource is unreachable,
    /// answers with a non-success status or has an empty body.
    fn get_text(&self, url: &str) -> Result<String, Error>;
}

impl Client for reqwest::blocking::Client {
    fn get_text(&self, url: &str) -> Result<String, Error> {
        let resp = self
            .get(url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| {
                Error::wrap_with(ErrorKind::Network, format!("Could not reach {url}"), e)
            })?;
        let text = resp
            .text()
            .map_err(|e| Error::wrap(ErrorKind::Network, e))?;

        if text.is_empty() {
            Err(Error::new(ErrorKind::Network, "Response text is empty"))
        } else {
            Ok(text)
        }
    }
}

/// Fetch the page at `url` using a default constructed `C`.
///
/// # Errors
///
/// Propagates the [`Client::get_text`] error.
pub fn fetch_page<C: Client>(url: &str) -> Result<String, Error> {
    trace!("Fetching abbreviations page from '{url}'");
    C::default().get_text(url)
}

#[cfg(test)]
pub(crate) use test::{impl_text_producer, MockTextClient, NetworkErrorProducer, Producer};

#[cfg(test)]
mod test {
    use super::*;

    pub(crate) trait Producer<T>
    where
        Self: Default,
    {
        fn produce() -> Result<T, Error>;
    }

    #[derive(Default)]
    pub(crate) struct MockTextClient<P: Producer<String>>(std::marker::PhantomData<P>);

    impl<P: Producer<String>> Client for MockTextClient<P> {
        fn get_text(&self, _: &str) -> Result<String, Error> {
            P::produce()
        }
    }

    macro_rules! impl_text_producer {
        ($($producer:ident => $exp:expr,)*) => {
            $(
                #[derive(Default)]
                pub(crate) struct $producer;

                impl crate::fetch::Producer<String> for $producer {
                    fn produce() -> Result<String, crate::Error> {
                        $exp
                    }
                }
            )*
        };
    }
    impl_text_producer! {
        NetworkErrorProducer => Err(Error::new(ErrorKind::Network, "Network error")),
    }

    pub(crate) use impl_text_producer;

    impl_text_producer! {
        PageProducer => Ok("<html><body><pre></pre></body></html>".to_owned()),
    }

    #[test]
    fn fetch_page_returns_client_text() {
        let text = fetch_page::<MockTextClient<PageProducer>>("http://example.com").unwrap();

        assert!(text.contains("<pre>"));
    }

    #[test]
    #[should_panic(expected = "Network error")]
    fn fetch_page_propagates_network_error() {
        fetch_page::<MockTextClient<NetworkErrorProducer>>("http://example.com").unwrap();
    }
}
