//! Concrete storage collaborators: the S3 read side and the Azure Blob
//! write side.
//!
//! The pipeline is synchronous; both backends hold a handle to the shared
//! tokio runtime and drive SDK futures to completion with `block_on` from
//! whichever worker thread is doing the transfer.

use anyhow::{Context, Result, bail};
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::primitives::ByteStream;
use azure_storage::StorageCredentials;
use azure_storage_blobs::prelude::{
    AccessTier as AzureTier, BlobBlockType, BlobServiceClient, BlockList,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::{Buf, Bytes};
use std::io::{self, Read};
use tokio::runtime::{Handle, Runtime};

use crosscopy::{
    AccessTier, ObjectBody, ObjectSink, ObjectSource, SinkError, SourceError, UploadOptions,
};

/// Upload block size. Azure allows much larger blocks; 4 MiB keeps the
/// per-worker memory footprint modest.
const BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// Read side: objects in S3 buckets, credentials from the default AWS chain.
pub struct S3Reader {
    client: S3Client,
    handle: Handle,
}

impl S3Reader {
    pub fn connect(runtime: &Runtime) -> Result<Self> {
        let config = runtime.block_on(aws_config::load_defaults(
            aws_config::BehaviorVersion::latest(),
        ));
        Ok(Self {
            client: S3Client::new(&config),
            handle: runtime.handle().clone(),
        })
    }
}

impl ObjectSource for S3Reader {
    fn read(&self, container: &str, key: &str) -> Result<ObjectBody, SourceError> {
        let resp = self
            .handle
            .block_on(self.client.get_object().bucket(container).key(key).send());
        match resp {
            Ok(output) => Ok(Box::new(BodyReader {
                handle: self.handle.clone(),
                body: output.body,
                chunk: Bytes::new(),
            })),
            Err(err) => {
                let service = err.into_service_error();
                if service.is_no_such_key() {
                    Err(SourceError::NotFound)
                } else {
                    Err(SourceError::Transient(Box::new(service)))
                }
            }
        }
    }
}

/// Sync adapter over the SDK's response body stream.
struct BodyReader {
    handle: Handle,
    body: ByteStream,
    chunk: Bytes,
}

impl Read for BodyReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.chunk.is_empty() {
            match self.handle.block_on(self.body.try_next()) {
                Ok(Some(chunk)) => self.chunk = chunk,
                Ok(None) => return Ok(0),
                Err(err) => return Err(io::Error::other(err)),
            }
        }
        let n = buf.len().min(self.chunk.len());
        buf[..n].copy_from_slice(&self.chunk[..n]);
        self.chunk.advance(n);
        Ok(n)
    }
}

/// Write side: block blobs in an Azure storage account, credentials from the
/// default Azure identity chain.
pub struct AzureWriter {
    service: BlobServiceClient,
    handle: Handle,
}

impl AzureWriter {
    pub fn connect(handle: Handle, url: &str) -> Result<Self> {
        let account = account_from_url(url)?;
        let credential = azure_identity::create_default_credential()
            .context("could not build Azure credential chain - try running `az login`")?;
        let service =
            BlobServiceClient::new(account, StorageCredentials::token_credential(credential));
        Ok(Self { service, handle })
    }
}

impl ObjectSink for AzureWriter {
    fn write(
        &self,
        container: &str,
        key: &str,
        mut body: ObjectBody,
        options: &UploadOptions,
    ) -> Result<(), SinkError> {
        let blob = self.service.container_client(container).blob_client(key);

        let mut blocks = Vec::new();
        loop {
            let chunk = next_block(&mut body).map_err(|err| SinkError::Transient(Box::new(err)))?;
            if chunk.is_empty() {
                break;
            }
            let block_id = STANDARD.encode(format!("{:08}", blocks.len()));
            self.handle
                .block_on(
                    blob.put_block(block_id.clone(), Bytes::from(chunk))
                        .into_future(),
                )
                .map_err(classify)?;
            blocks.push(BlobBlockType::new_uncommitted(block_id));
        }

        // An empty block list still commits, producing a zero-length blob.
        let put_list = blob
            .put_block_list(BlockList { blocks })
            .access_tier(azure_tier(options.tier));
        self.handle.block_on(put_list.into_future()).map_err(classify)?;
        Ok(())
    }
}

/// Pull up to one block's worth of bytes from the body.
fn next_block(body: &mut ObjectBody) -> io::Result<Vec<u8>> {
    let mut chunk = Vec::new();
    (&mut **body)
        .take(BLOCK_SIZE as u64)
        .read_to_end(&mut chunk)?;
    Ok(chunk)
}

fn classify(err: azure_core::Error) -> SinkError {
    let status = err.as_http_error().map(|http| http.status());
    match status {
        Some(azure_core::StatusCode::Unauthorized | azure_core::StatusCode::Forbidden) => {
            SinkError::Permission(Box::new(err))
        }
        _ => SinkError::Transient(Box::new(err)),
    }
}

fn azure_tier(tier: AccessTier) -> AzureTier {
    match tier {
        AccessTier::Hot => AzureTier::Hot,
        AccessTier::Cool => AzureTier::Cool,
        AccessTier::Archive => AzureTier::Archive,
    }
}

/// Pull the storage account name out of an endpoint URL like
/// `https://myaccount.blob.core.windows.net/`.
fn account_from_url(url: &str) -> Result<String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .with_context(|| format!("azure-url {url:?} must start with https://"))?;
    let host = rest.split('/').next().unwrap_or(rest);
    let account = host.split('.').next().unwrap_or("");
    if account.is_empty() {
        bail!("could not determine storage account from {url:?}");
    }
    Ok(account.to_string())
}
