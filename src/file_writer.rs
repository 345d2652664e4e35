use crate::attr::EventAttr;
use crate::buffer::ByteWriter;
use crate::error::Error;
use crate::feature_sections::AttributeDescription;
use crate::features::{Feature, FeatureSet};
use crate::file_reader::PerfData;
use crate::header::FileHeader;
use crate::section::FileSection;

/// The writer's section layout, in file order: header, per-attr ID arrays,
/// the attribute table, event data, the feature index, feature payloads.
struct Layout {
    ids_sections: Vec<FileSection>,
    attr_section: FileSection,
    attr_stride: u64,
    data_section: FileSection,
    feature_index_offset: u64,
}

impl PerfData {
    /// Serialize the model back into a seekable perf.data byte stream.
    ///
    /// The output is written in the model's endianness. Event header sizes
    /// are recomputed from the serialized payloads, so events whose
    /// variable parts changed (rewritten filenames, injected build IDs) come
    /// out self-consistent.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut event_writer = ByteWriter::new(self.endian());
        for event in &self.events {
            let attr = self
                .attrs
                .get(event.attr_index)
                .ok_or(Error::NoAttributes)?
                .attr;
            event.write(&mut event_writer, &attr);
        }
        let event_bytes = event_writer.into_vec();

        let feature_payloads = self.feature_payloads();
        let layout = self.compute_layout(event_bytes.len() as u64);

        let mut writer = ByteWriter::new(self.endian());
        let mut features = FeatureSet::default();
        for (feature, _) in &feature_payloads {
            features.insert(*feature);
        }
        let header = FileHeader {
            header_size: FileHeader::STRUCT_SIZE as u64,
            attr_size: layout.attr_stride,
            attr_section: layout.attr_section,
            data_section: layout.data_section,
            event_types_section: FileSection::default(),
            features,
        };
        header.write(&mut writer);

        // Per-attribute ID arrays.
        for desc in &self.attrs {
            for id in &desc.event_ids {
                writer.write_u64(*id);
            }
        }

        // The attribute table: each entry is the attr followed by the
        // section pointing at its ID array.
        debug_assert_eq!(writer.tell() as u64, layout.attr_section.offset);
        for (desc, ids_section) in self.attrs.iter().zip(&layout.ids_sections) {
            let mut attr = desc.attr;
            attr.size = EventAttr::CURRENT_SIZE;
            attr.write(&mut writer);
            ids_section.write(&mut writer);
        }

        debug_assert_eq!(writer.tell() as u64, layout.data_section.offset);
        writer.write_bytes(&event_bytes);

        // Feature index, one (offset, size) per set bit in bit order, then
        // the payloads in the same order.
        debug_assert_eq!(writer.tell() as u64, layout.feature_index_offset);
        let mut payload_offset =
            layout.feature_index_offset + (feature_payloads.len() * FileSection::STRUCT_SIZE) as u64;
        for (_, payload) in &feature_payloads {
            FileSection {
                offset: payload_offset,
                size: payload.len() as u64,
            }
            .write(&mut writer);
            payload_offset += payload.len() as u64;
        }
        for (_, payload) in &feature_payloads {
            writer.write_bytes(payload);
        }

        Ok(writer.into_vec())
    }

    /// The feature payloads to emit, in feature-bit order. Sections whose
    /// contents this crate models (BUILD_ID, TRACING_DATA, EVENT_DESC) are
    /// regenerated from the model so that mutations show up in the output;
    /// everything else is passed through byte-for-byte.
    fn feature_payloads(&self) -> Vec<(Feature, Vec<u8>)> {
        let mut mask = FeatureSet::default();
        for feature in self.feature_sections.keys() {
            mask.insert(*feature);
        }
        if !self.build_ids.is_empty() {
            mask.insert(Feature::BUILD_ID);
        }
        if !self.tracing_data.is_empty() {
            mask.insert(Feature::TRACING_DATA);
        }

        let mut payloads = Vec::with_capacity(mask.len());
        for feature in mask.iter() {
            let payload = match feature {
                Feature::BUILD_ID => {
                    let mut w = ByteWriter::new(self.endian());
                    for record in self.build_ids.to_records() {
                        record.write(&mut w);
                    }
                    w.into_vec()
                }
                Feature::TRACING_DATA => self.tracing_data.clone(),
                Feature::EVENT_DESC => {
                    let mut w = ByteWriter::new(self.endian());
                    AttributeDescription::write_event_desc_section(&mut w, &self.attrs);
                    w.into_vec()
                }
                _ => match self.feature_sections.get(&feature) {
                    Some(raw) => raw.clone(),
                    None => continue,
                },
            };
            payloads.push((feature, payload));
        }
        payloads
    }

    fn compute_layout(&self, data_size: u64) -> Layout {
        let attr_stride = EventAttr::CURRENT_SIZE as u64 + FileSection::STRUCT_SIZE as u64;

        let mut cursor = FileHeader::STRUCT_SIZE as u64;
        let mut ids_sections = Vec::with_capacity(self.attrs.len());
        for desc in &self.attrs {
            let size = desc.event_ids.len() as u64 * 8;
            ids_sections.push(FileSection {
                offset: cursor,
                size,
            });
            cursor += size;
        }

        let attr_section = FileSection {
            offset: cursor,
            size: self.attrs.len() as u64 * attr_stride,
        };
        cursor += attr_section.size;

        let data_section = FileSection {
            offset: cursor,
            size: data_size,
        };
        cursor += data_size;

        Layout {
            ids_sections,
            attr_section,
            attr_stride,
            data_section,
            feature_index_offset: cursor,
        }
    }
}
