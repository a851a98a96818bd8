use crate::config::Config;
use crate::error::Result;
use crate::hive::{DataHive, MetaHive};
use crate::object::BlobCodec;

/// the two collaborators plus the codec used to talk to them
pub struct Store {
    data: Box<dyn DataHive>,
    meta: Box<dyn MetaHive>,
    codec: BlobCodec,
}

impl Store {
    pub fn new(data: Box<dyn DataHive>, meta: Box<dyn MetaHive>, codec: BlobCodec) -> Self {
        Self { data, meta, codec }
    }

    /// open the hives named by a configuration
    pub fn open(config: &Config) -> Result<Self> {
        let codec = config.codec()?;
        let data = config.open_data()?;
        let meta = config.open_meta()?;
        Ok(Self::new(data, meta, codec))
    }

    /// chunk and chain entry storage
    pub fn data(&self) -> &dyn DataHive {
        self.data.as_ref()
    }

    /// tag and edge storage
    pub fn meta(&self) -> &dyn MetaHive {
        self.meta.as_ref()
    }

    pub fn codec(&self) -> &BlobCodec {
        &self.codec
    }

    /// release both collaborators
    pub fn close(self) -> Result<()> {
        let data = self.data.close();
        let meta = self.meta.close();
        data.and(meta)
    }
}
