//! Field layouts for the sfnt tables the engine reads: the offset subtable and
//! table directory, `maxp`, `name`, `cmap` (header, encoding records, and
//! formats 4/12), `head`, `hhea`, and `hmtx`.
//!
//! Each `Position<TableName>` gets one accessor method per field, returning a
//! `Position<FieldType>` at that field's fixed byte offset — generated by
//! `sfnt_table!` instead of hand-counting offsets.

use crate::fonts::parsing::Position;
use crate::fonts::types::*;

pub(in crate::fonts) trait SfntTable {
    const TAG: Tag;
}

macro_rules! sfnt_table {
    ($name:ident { $( $field:ident : $ty:ty ),+ $(,)? }) => {
        pub(in crate::fonts) struct $name;

        #[allow(dead_code)]
        impl Position<$name> {
            sfnt_table!(@accessors 0u32; $( $field : $ty ),+);
        }
    };
    (#[tag = $tag:expr] $name:ident { $( $field:ident : $ty:ty ),+ $(,)? }) => {
        sfnt_table!($name { $( $field : $ty ),+ });

        impl SfntTable for $name {
            const TAG: Tag = Tag(*$tag);
        }
    };
    (@accessors $offset:expr; $field:ident : $ty:ty $(, $rest:ident : $rest_ty:ty)* $(,)?) => {
        #[inline]
        pub(in crate::fonts) fn $field(self) -> Position<$ty> {
            self.offset_bytes($offset)
        }
        sfnt_table!(@accessors ($offset + ::std::mem::size_of::<$ty>() as u32); $( $rest : $rest_ty ),*);
    };
    (@accessors $offset:expr;) => {};
}

sfnt_table! {
    OffsetSubtable {
        scaler_type: u32,
        table_count: u16,
        search_range: u16,
        entry_selector: u16,
        range_shift: u16,
    }
}

sfnt_table! {
    TableDirectoryEntry {
        tag: Tag,
        checksum: u32,
        table_offset: u32,
        length: u32,
    }
}

sfnt_table! {
    #[tag = b"maxp"]
    MaximumProfile {
        version: FixedPoint,
        num_glyphs: u16,
    }
}

sfnt_table! {
    #[tag = b"name"]
    NamingTableHeader {
        format: u16,
        count: u16,
        string_offset: u16,
    }
}

sfnt_table! {
    NameRecord {
        platform_id: u16,
        encoding_id: u16,
        language_id: u16,
        name_id: u16,
        length: u16,
        string_offset: u16,
    }
}

sfnt_table! {
    #[tag = b"cmap"]
    CmapHeader {
        version: u16,
        num_tables: u16,
    }
}

sfnt_table! {
    CmapEncodingRecord {
        platform_id: u16,
        encoding_id: u16,
        subtable_offset: u32,
    }
}

sfnt_table! {
    CmapFormat4Header {
        format: u16,
        length: u16,
        language: u16,
        segment_count_x2: u16,
        search_range: u16,
        entry_selector: u16,
        range_shift: u16,
    }
}

sfnt_table! {
    CmapFormat12Header {
        format: u16,
        reserved: u16,
        length: u32,
        language: u32,
        num_groups: u32,
    }
}

sfnt_table! {
    CmapFormat12Group {
        start_char_code: u32,
        end_char_code: u32,
        start_glyph_id: u32,
    }
}

sfnt_table! {
    #[tag = b"head"]
    FontHeader {
        version: FixedPoint,
        font_revision: FixedPoint,
        checksum_adjustment: u32,
        magic_number: u32,
        flags: u16,
        units_per_em: FontDesignUnitsPerEmFactorU16,
        created: LongDateTime,
        modified: LongDateTime,
        min_x: FWord,
        min_y: FWord,
        max_x: FWord,
        max_y: FWord,
        mac_style: u16,
        smallest_readable_size_in_px_per_em: u16,
        font_direction_hint: i16,
        index_to_loc_format: i16,
        glyph_data_format: i16,
    }
}

sfnt_table! {
    #[tag = b"hhea"]
    HorizontalHeader {
        version: FixedPoint,
        ascender: FWord,
        descender: FWord,
        line_gap: FWord,
        max_advance_width: UFWord,
        min_left_side_bearing: FWord,
        max_left_side_bearing: FWord,
        x_max_extent: FWord,
        caret_slope_rise: i16,
        caret_slope_run: i16,
        caret_offset: FWord,
        reserved_1: i16,
        reserved_2: i16,
        reserved_3: i16,
        reserved_4: i16,
        metric_data_format: i16,
        number_of_long_horizontal_metrics: u16,
    }
}

sfnt_table! {
    #[tag = b"hmtx"]
    LongHorizontalMetricsRecord {
        advance_width: UFWord,
        left_side_bearing: i16,
    }
}
