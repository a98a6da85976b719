pub mod ports;
pub mod flatfile_use_case;
pub mod degrade_use_case;
pub mod concat_use_case;
